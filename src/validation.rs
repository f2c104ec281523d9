//! Validation errors: the field-keyed map the editor renders from, and the
//! normalization of the two server failure shapes into it.
//!
//! Some endpoints reject with a single `{"detail": "..."}` string, others
//! with a per-field `{"field": ["..."]}` mapping. Both are normalized into
//! [`ValidationFailure`] once, at the gateway boundary, so nothing
//! downstream ever branches on payload shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityDraft;

/// Reserved key for whole-request errors not attributable to one field.
pub const DETAIL_KEY: &str = "detail";

pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// A rejected submission, already normalized from either wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationFailure {
    Detail { detail: String },
    FieldErrors(BTreeMap<String, Vec<String>>),
}

impl ValidationFailure {
    pub fn detail(message: impl Into<String>) -> Self {
        Self::Detail {
            detail: message.into(),
        }
    }

    pub fn field(key: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(key.into(), vec![message.into()]);
        Self::FieldErrors(errors)
    }

    /// Parse a raw response body in either shape.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// Field key to ordered human-readable messages. Replaced wholesale when a
/// submission is rejected; cleared one entry at a time as the user fixes
/// fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrorMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl ValidationErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole map with the server's verdict. The server is
    /// authoritative after a submission; stale client entries do not
    /// survive the merge.
    pub fn merge(&mut self, failure: ValidationFailure) {
        self.entries = match failure {
            ValidationFailure::Detail { detail } => {
                let mut entries = BTreeMap::new();
                entries.insert(DETAIL_KEY.to_string(), vec![detail]);
                entries
            }
            ValidationFailure::FieldErrors(entries) => entries,
        };
    }

    /// Remove exactly one field's entry. No-op when absent.
    pub fn clear(&mut self, key: &str) {
        self.entries.remove(key);
    }

    pub fn has_any(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Append a client-side message under a field key.
    pub fn attach(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(message.into());
    }

    pub fn messages_for(&self, key: &str) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn detail(&self) -> Option<&str> {
        self.entries
            .get(DETAIL_KEY)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// The fields that must be non-empty before a submission leaves the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Name,
    Website,
    ContactName,
    ContactMethods,
    EntityTypes,
}

/// Static table mapping each required field to its error key. Consulted by
/// field identity, never by comparing live values, so two fields holding
/// the same text can never clear each other's errors. Note both contact
/// channels report under the one `contact` key.
pub const REQUIRED_FIELDS: [(RequiredField, &str); 5] = [
    (RequiredField::Name, "coop_name"),
    (RequiredField::Website, "websites"),
    (RequiredField::ContactName, "contact_name"),
    (RequiredField::ContactMethods, "contact"),
    (RequiredField::EntityTypes, "entity_types"),
];

fn is_satisfied(field: RequiredField, draft: &EntityDraft) -> bool {
    let filled = |value: &Option<String>| {
        value
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    };
    match field {
        RequiredField::Name => filled(&draft.name),
        RequiredField::Website => filled(&draft.web_site),
        RequiredField::ContactName => filled(&draft.contact_name),
        RequiredField::ContactMethods => draft
            .contact_methods
            .iter()
            .any(|m| !m.value().trim().is_empty()),
        RequiredField::EntityTypes => !draft.entity_types.is_empty(),
    }
}

/// Run the required-field gate. An empty result means the draft may be
/// submitted.
pub fn required_field_errors(draft: &EntityDraft) -> ValidationErrorMap {
    let mut errors = ValidationErrorMap::new();
    for (field, key) in REQUIRED_FIELDS {
        if !is_satisfied(field, draft) {
            errors.attach(key, REQUIRED_MESSAGE);
        }
    }
    errors
}

/// Clear exactly the error entries whose backing field is now non-empty.
/// Runs after every field edit while errors are outstanding; unrelated
/// entries are never touched.
pub fn clear_satisfied(errors: &mut ValidationErrorMap, draft: &EntityDraft) {
    for (field, key) in REQUIRED_FIELDS {
        if errors.has_field(key) && is_satisfied(field, draft) {
            errors.clear(key);
        }
    }
}

/// Cross-field equality check for confirmation-style inputs. On mismatch
/// the same message is attached to both keys and submission must be
/// blocked without a network call.
pub fn matching_values(
    errors: &mut ValidationErrorMap,
    key_a: &str,
    value_a: &str,
    key_b: &str,
    value_b: &str,
    message: &str,
) -> bool {
    if value_a == value_b {
        return true;
    }
    errors.attach(key_a, message);
    errors.attach(key_b, message);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_payload_normalizes_to_detail_entry() {
        let failure = ValidationFailure::from_json(r#"{"detail": "Not found."}"#).unwrap();
        let mut errors = ValidationErrorMap::new();
        errors.merge(failure);

        assert_eq!(errors.detail(), Some("Not found."));
    }

    #[test]
    fn field_payload_normalizes_to_field_entries() {
        let failure =
            ValidationFailure::from_json(r#"{"coop_name": ["This field is required."]}"#).unwrap();
        let mut errors = ValidationErrorMap::new();
        errors.merge(failure);

        assert_eq!(errors.messages_for("coop_name"), [REQUIRED_MESSAGE]);
        assert!(errors.detail().is_none());
    }

    #[test]
    fn merge_replaces_previous_entries() {
        let mut errors = ValidationErrorMap::new();
        errors.attach("websites", REQUIRED_MESSAGE);
        errors.merge(ValidationFailure::field("state", "ZZ is not a valid state."));

        assert!(!errors.has_field("websites"));
        assert!(errors.has_field("state"));
    }

    #[test]
    fn clear_is_a_noop_when_absent() {
        let mut errors = ValidationErrorMap::new();
        errors.attach("coop_name", REQUIRED_MESSAGE);
        errors.clear("websites");

        assert!(errors.has_field("coop_name"));
    }

    #[test]
    fn mismatch_attaches_symmetric_errors() {
        let mut errors = ValidationErrorMap::new();
        let matched = matching_values(
            &mut errors,
            "new_password",
            "hunter2",
            "confirm_new_password",
            "hunter3",
            "New passwords do not match",
        );

        assert!(!matched);
        assert_eq!(
            errors.messages_for("new_password"),
            errors.messages_for("confirm_new_password")
        );
    }
}
