//! Approval workflow: the state machine driving a change-request session.
//!
//! One context per open editor session. All transitions are triggered by
//! discrete events (open, field edit, submit, gateway outcome) and run to
//! completion before the next event; a submit is only accepted while the
//! machine sits in `Editing`, which is what makes a re-entrant submit a
//! structural no-op.

use tracing::{info, warn};

use crate::config::DirectoryConfig;
use crate::diff::{DiffSet, compute_diff};
use crate::entity::{Entity, EntityDraft};
use crate::error::GatewayError;
use crate::gateway::PersistenceGateway;
use crate::validation::{self, ValidationErrorMap, ValidationFailure};

/// How the session was opened. Fixed for the context's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No identifier, no baseline; submit creates a new record.
    Create,
    /// Submitter-initiated edit; submit stores a proposed change without
    /// touching the live record.
    Update,
    /// Reviewer path; the form is seeded from the proposed values and
    /// submit applies them to the live record.
    Approve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Editing,
    Submitting,
    Succeeded,
    Rejected,
}

/// Everything one change-request session holds: target, baseline, the
/// working draft, the last computed diff, and outstanding errors. Created
/// when the editor opens; discarded after a terminal transition.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    pub target_id: Option<String>,
    pub mode: Mode,
    pub state: WorkflowState,
    pub baseline: Option<Entity>,
    pub draft: EntityDraft,
    pub diffs: DiffSet,
    pub errors: ValidationErrorMap,
    /// Banner text when the baseline fetch failed; field errors stay empty.
    pub load_error: Option<String>,
}

impl WorkflowContext {
    fn editing(mode: Mode, target_id: Option<String>, baseline: Option<Entity>, draft: EntityDraft) -> Self {
        Self {
            target_id,
            mode,
            state: WorkflowState::Editing,
            baseline,
            draft,
            diffs: DiffSet::default(),
            errors: ValidationErrorMap::new(),
            load_error: None,
        }
    }
}

/// Outcome of a submit event.
#[derive(Debug)]
pub enum Submission {
    /// The gateway accepted the payload. `return_to_listing` is set only
    /// for submitter sessions opened via an identifier.
    Saved {
        entity: Entity,
        confirmation: String,
        return_to_listing: bool,
    },
    /// The gateway rejected the payload; the context's error map now holds
    /// the server's verdict and every entered value is retained.
    Rejected,
    /// The required-field gate failed; no network call was made.
    Blocked,
    /// The machine was not in `Editing`; nothing happened.
    NotEditing,
}

pub struct ApprovalWorkflow<G> {
    gateway: G,
    config: DirectoryConfig,
}

impl<G: PersistenceGateway> ApprovalWorkflow<G> {
    pub fn new(gateway: G, config: DirectoryConfig) -> Self {
        Self { gateway, config }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Open a session for a brand-new record, seeded from configured
    /// defaults.
    pub fn open_create(&self) -> WorkflowContext {
        let draft = EntityDraft::new()
            .set_country(self.config.default_country.clone())
            .set_state(self.config.default_state.clone())
            .set_address_public(self.config.default_is_public)
            .set_contact_name_public(self.config.default_is_public);

        WorkflowContext::editing(Mode::Create, None, None, draft)
    }

    /// Open a submitter session against an existing record. The draft is
    /// pre-filled from the baseline. When the fetch fails the session
    /// degrades to create-like editing with a load-error banner.
    pub fn open_update(&self, id: &str) -> WorkflowContext {
        match self.gateway.fetch_entity(id) {
            Ok(entity) => {
                let draft = EntityDraft::from_entity(&entity);
                WorkflowContext::editing(Mode::Update, Some(id.to_string()), Some(entity), draft)
            }
            Err(err) => self.degraded(id, err),
        }
    }

    /// Open a reviewer session. When the record carries a pending proposed
    /// change the editable fields are seeded from the proposed values, not
    /// the baseline, and the diff against the baseline is precomputed so
    /// changed fields can render their previous values.
    pub fn open_approve(&self, id: &str) -> WorkflowContext {
        match self.gateway.fetch_entity(id) {
            Ok(entity) => {
                let seed = EntityDraft::from_entity(&entity);
                let (draft, diffs) = match &entity.proposed_changes {
                    Some(proposed) => (
                        seed.overlay(proposed),
                        compute_diff(Some(&entity), proposed),
                    ),
                    None => (seed, DiffSet::default()),
                };
                let mut ctx = WorkflowContext::editing(
                    Mode::Approve,
                    Some(id.to_string()),
                    Some(entity),
                    draft,
                );
                ctx.diffs = diffs;
                ctx
            }
            Err(err) => self.degraded(id, err),
        }
    }

    fn degraded(&self, id: &str, err: GatewayError) -> WorkflowContext {
        warn!(id, error = %err, "baseline fetch failed, degrading to create-like session");
        let mut ctx = self.open_create();
        ctx.load_error = Some(format!("Error: {err}"));
        ctx
    }

    /// The discrete "user edited a field" event. Re-enters `Editing` from
    /// `Rejected` and clears exactly the outstanding required-field errors
    /// whose backing field is now non-empty.
    pub fn field_edited(&self, ctx: &mut WorkflowContext) {
        if ctx.state == WorkflowState::Rejected {
            ctx.state = WorkflowState::Editing;
        }
        if ctx.errors.has_any() {
            validation::clear_satisfied(&mut ctx.errors, &ctx.draft);
        }
    }

    /// The explicit submit action.
    ///
    /// Runs the required-field gate, computes the diff against the loaded
    /// baseline, dispatches the mode's gateway operation, and settles in
    /// `Succeeded` or `Rejected`. Every failure ends as map entries; user
    /// entered values are never cleared.
    pub fn submit(&self, ctx: &mut WorkflowContext) -> Submission {
        if ctx.state != WorkflowState::Editing {
            return Submission::NotEditing;
        }

        let required = validation::required_field_errors(&ctx.draft);
        if required.has_any() {
            ctx.errors = required;
            return Submission::Blocked;
        }

        ctx.state = WorkflowState::Submitting;
        ctx.diffs = compute_diff(ctx.baseline.as_ref(), &ctx.draft);

        let result = match (ctx.mode, ctx.target_id.as_deref()) {
            (Mode::Create, _) | (Mode::Update, None) => self.gateway.create_entity(&ctx.draft),
            (Mode::Update, Some(id)) => self.gateway.propose_change(id, &ctx.draft),
            (Mode::Approve, Some(id)) => self.gateway.finalize_approval(id, &ctx.draft),
            (Mode::Approve, None) => {
                ctx.errors
                    .merge(ValidationFailure::detail("Cannot access requested entity."));
                ctx.state = WorkflowState::Rejected;
                return Submission::Rejected;
            }
        };

        match result {
            Ok(entity) => {
                ctx.state = WorkflowState::Succeeded;
                let confirmation = format!("Form Submission for {} successful", entity.name);
                let return_to_listing = ctx.target_id.is_some() && ctx.mode != Mode::Approve;
                info!(mode = ?ctx.mode, name = %entity.name, "change request accepted");
                Submission::Saved {
                    entity,
                    confirmation,
                    return_to_listing,
                }
            }
            Err(GatewayError::Rejected(failure)) => {
                ctx.errors.merge(failure);
                ctx.state = WorkflowState::Rejected;
                warn!(mode = ?ctx.mode, "change request rejected by validation");
                Submission::Rejected
            }
            Err(err) => {
                // Transport and storage failures surface exactly like an
                // application-level rejection, as a detail-only error.
                ctx.errors.merge(ValidationFailure::detail(err.to_string()));
                ctx.state = WorkflowState::Rejected;
                warn!(mode = ?ctx.mode, error = %err, "change request failed");
                Submission::Rejected
            }
        }
    }
}
