//! Persistence boundary: the gateway contract and the sled-backed store.

use std::collections::BTreeMap;
use std::sync::Arc;

use sled::{Batch, Db};
use tracing::{debug, info};

use crate::entity::{ContactMethod, Entity, EntityDraft, TimeStamp};
use crate::error::GatewayError;
use crate::reference::ReferenceDirectory;
use crate::utils;
use crate::validation::{REQUIRED_MESSAGE, ValidationFailure};

/// What the approval workflow needs from the backing store. Each call
/// resolves to exactly one success or one failure; a rejection carries the
/// normalized validation payload.
pub trait PersistenceGateway {
    fn fetch_entity(&self, id: &str) -> Result<Entity, GatewayError>;
    fn create_entity(&self, draft: &EntityDraft) -> Result<Entity, GatewayError>;
    fn propose_change(&self, id: &str, draft: &EntityDraft) -> Result<Entity, GatewayError>;
    fn finalize_approval(&self, id: &str, draft: &EntityDraft) -> Result<Entity, GatewayError>;
}

// What actually sits in the store under an entity id. The pending payload
// itself lives in a separate content-addressed slot so a replaced proposal
// is one reference swap.
#[derive(minicbor::Encode, minicbor::Decode, Debug)]
struct StoredRecord {
    #[n(0)]
    entity: Entity,
    #[n(1)]
    proposed_hash: Option<String>,
}

pub struct DirectoryStore {
    instance: Arc<Db>,
    reference: ReferenceDirectory,
}

impl DirectoryStore {
    pub fn new(instance: Arc<Db>, reference: ReferenceDirectory) -> Self {
        Self {
            instance,
            reference,
        }
    }

    fn load_record(&self, id: &str) -> Result<StoredRecord, GatewayError> {
        let bytes = self
            .instance
            .get(id.as_bytes())?
            .ok_or_else(|| GatewayError::NotFound(id.to_string()))?;
        Ok(minicbor::decode(&bytes)?)
    }

    /// Server-side validation, mirroring what the directory API enforces.
    /// Errors are keyed with the same field keys the editor uses.
    fn validate(&self, draft: &EntityDraft) -> Result<(), ValidationFailure> {
        let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();

        if draft.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            errors
                .entry("coop_name".to_string())
                .or_default()
                .push(REQUIRED_MESSAGE.to_string());
        }

        if let Some(state) = draft.state.as_deref().filter(|s| !s.trim().is_empty()) {
            let country = draft
                .country
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(crate::config::DEFAULT_COUNTRY_CODE);
            if !self.reference.has_province(country, state.trim()) {
                errors.entry("state".to_string()).or_default().push(format!(
                    "{state} is not a valid state for country {country}."
                ));
            }
        }

        for method in &draft.contact_methods {
            match method {
                ContactMethod::Email { address, .. } => {
                    if address.trim().is_empty() {
                        errors
                            .entry("contact".to_string())
                            .or_default()
                            .push("Either an email or a phone number must be provided.".to_string());
                    } else if !address.contains('@') {
                        errors
                            .entry("contact".to_string())
                            .or_default()
                            .push("Enter a valid email address.".to_string());
                    }
                }
                ContactMethod::Phone { number, .. } => {
                    if number.trim().is_empty() {
                        errors
                            .entry("contact".to_string())
                            .or_default()
                            .push("Either an email or a phone number must be provided.".to_string());
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::FieldErrors(errors))
        }
    }
}

impl PersistenceGateway for DirectoryStore {
    fn fetch_entity(&self, id: &str) -> Result<Entity, GatewayError> {
        let record = self.load_record(id)?;
        let mut entity = record.entity;

        if let Some(hash) = &record.proposed_hash {
            if let Some(bytes) = self.instance.get(hash.as_bytes())? {
                entity.proposed_changes = Some(minicbor::decode(&bytes)?);
            }
        }
        debug!(id, pending = entity.proposed_changes.is_some(), "fetched entity");

        Ok(entity)
    }

    fn create_entity(&self, draft: &EntityDraft) -> Result<Entity, GatewayError> {
        self.validate(draft).map_err(GatewayError::Rejected)?;

        let id = utils::new_uuid_to_bech32("org_")
            .map_err(|err| GatewayError::Ident(err.to_string()))?;

        let mut entity = Entity::new();
        entity.apply_draft(draft);
        entity.id = Some(id.clone());
        entity.rec_updated = TimeStamp::new();

        let record = StoredRecord {
            entity: entity.clone(),
            proposed_hash: None,
        };
        self.instance
            .insert(id.as_bytes(), minicbor::to_vec(&record)?)?;
        info!(%id, name = %entity.name, "created directory entity");

        Ok(entity)
    }

    fn propose_change(&self, id: &str, draft: &EntityDraft) -> Result<Entity, GatewayError> {
        let mut record = self.load_record(id)?;
        self.validate(draft).map_err(GatewayError::Rejected)?;

        let (hash, payload) = draft
            .finalise()
            .map_err(|err| GatewayError::Encode(err.to_string()))?;

        // Last write wins: drop the superseded payload before storing the
        // replacement reference.
        let mut batch = Batch::default();
        if let Some(previous) = record.proposed_hash.take() {
            if previous != hash {
                batch.remove(previous.as_bytes());
            }
        }
        batch.insert(hash.as_bytes(), payload);
        record.proposed_hash = Some(hash);
        batch.insert(id.as_bytes(), minicbor::to_vec(&record)?);
        self.instance.apply_batch(batch)?;
        info!(id, "stored proposed change for review");

        let mut entity = record.entity;
        entity.proposed_changes = Some(draft.clone());
        Ok(entity)
    }

    fn finalize_approval(&self, id: &str, draft: &EntityDraft) -> Result<Entity, GatewayError> {
        let mut record = self.load_record(id)?;
        self.validate(draft).map_err(GatewayError::Rejected)?;

        record.entity.apply_draft(draft);
        record.entity.rec_updated = TimeStamp::new();
        record.entity.proposed_changes = None;

        let mut batch = Batch::default();
        if let Some(hash) = record.proposed_hash.take() {
            batch.remove(hash.as_bytes());
        }
        batch.insert(id.as_bytes(), minicbor::to_vec(&record)?);
        self.instance.apply_batch(batch)?;
        info!(id, name = %record.entity.name, "approved proposed change");

        Ok(record.entity)
    }
}
