//! Field-level diff between a baseline record and a candidate payload.
//!
//! The tracked field set is fixed: every reviewable input on the change
//! request form has exactly one extraction rule here, so "which fields
//! changed" is driven by data, never by inspecting presentation state.
//!
//! Comparison is presence-aware: a candidate value that is absent or blank
//! means "no change requested" and always compares as unchanged. Without
//! that rule, a form pre-filled with blanks would appear to erase every
//! field it never touched.

use std::collections::{BTreeMap, BTreeSet};

use crate::entity::{Entity, EntityDraft};

/// Shown as the previous value when the baseline never held one.
pub const NOT_FILLED: &str = "Not filled";

/// The fixed set of tracked fields. Each variant documents where both sides
/// of its comparison come from, since the record nests address and contact
/// data one level deeper than the flat draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiffField {
    /// `entity.name` vs `draft.name`.
    Name,
    /// First address's street vs `draft.street`.
    Street,
    /// First address's city vs `draft.city`.
    City,
    /// First address's state code vs `draft.state`.
    State,
    /// First address's postal code vs `draft.postal_code`.
    Zip,
    /// First email contact's address on either side.
    ContactEmail,
    /// First phone contact's number on either side.
    ContactPhone,
    /// Type-name lists compared as order-independent sets.
    EntityTypes,
    /// `entity.web_site` vs `draft.web_site`.
    Website,
    /// `entity.description` vs `draft.description`.
    Description,
    /// First address's visibility flag vs `draft.address_public`.
    AddressPublic,
}

impl DiffField {
    pub const ALL: [DiffField; 11] = [
        DiffField::Name,
        DiffField::Street,
        DiffField::City,
        DiffField::State,
        DiffField::Zip,
        DiffField::ContactEmail,
        DiffField::ContactPhone,
        DiffField::EntityTypes,
        DiffField::Website,
        DiffField::Description,
        DiffField::AddressPublic,
    ];

    /// The validation-error key this field's input reports under. Both
    /// contact channels share one key.
    pub fn error_key(self) -> &'static str {
        match self {
            DiffField::Name => "coop_name",
            DiffField::Street => "street",
            DiffField::City => "city",
            DiffField::State => "state",
            DiffField::Zip => "zip",
            DiffField::ContactEmail | DiffField::ContactPhone => "contact",
            DiffField::EntityTypes => "entity_types",
            DiffField::Website => "websites",
            DiffField::Description => "description",
            DiffField::AddressPublic => "address_public",
        }
    }
}

/// Comparison result for one field. `previous_display` is populated only
/// when the field changed, ready to render alongside the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDiff {
    pub baseline: Option<String>,
    pub proposed: Option<String>,
    pub changed: bool,
    pub previous_display: Option<String>,
}

/// Per-field diffs covering every tracked field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSet {
    fields: BTreeMap<DiffField, FieldDiff>,
}

impl Default for DiffSet {
    fn default() -> Self {
        let fields = DiffField::ALL
            .iter()
            .map(|field| (*field, FieldDiff::default()))
            .collect();
        Self { fields }
    }
}

impl DiffSet {
    pub fn get(&self, field: DiffField) -> &FieldDiff {
        // every tracked field is present by construction
        &self.fields[&field]
    }

    pub fn changed_fields(&self) -> Vec<DiffField> {
        self.fields
            .iter()
            .filter(|(_, diff)| diff.changed)
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn any_changed(&self) -> bool {
        self.fields.values().any(|diff| diff.changed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DiffField, &FieldDiff)> {
        self.fields.iter().map(|(field, diff)| (*field, diff))
    }

    fn insert(&mut self, field: DiffField, diff: FieldDiff) {
        self.fields.insert(field, diff);
    }
}

/// Compute the diff of `candidate` against `baseline`.
///
/// With no baseline (create mode) there is nothing to compare against and
/// every field reports unchanged. The function is pure; neither side is
/// mutated.
pub fn compute_diff(baseline: Option<&Entity>, candidate: &EntityDraft) -> DiffSet {
    let mut set = DiffSet::default();
    let has_baseline = baseline.is_some();
    let address = baseline.and_then(Entity::first_address);

    set.insert(
        DiffField::Name,
        scalar_diff(
            baseline.map(|e| e.name.clone()),
            candidate.name.clone(),
            has_baseline,
        ),
    );
    set.insert(
        DiffField::Street,
        scalar_diff(
            address.map(|a| a.street_address.clone()),
            candidate.street.clone(),
            has_baseline,
        ),
    );
    set.insert(
        DiffField::City,
        scalar_diff(
            address.map(|a| a.city.clone()),
            candidate.city.clone(),
            has_baseline,
        ),
    );
    set.insert(
        DiffField::State,
        scalar_diff(
            address.map(|a| a.state.clone()),
            candidate.state.clone(),
            has_baseline,
        ),
    );
    set.insert(
        DiffField::Zip,
        scalar_diff(
            address.map(|a| a.postal_code.clone()),
            candidate.postal_code.clone(),
            has_baseline,
        ),
    );
    set.insert(
        DiffField::ContactEmail,
        scalar_diff(
            baseline.and_then(Entity::first_email).map(str::to_string),
            candidate.first_email().map(str::to_string),
            has_baseline,
        ),
    );
    set.insert(
        DiffField::ContactPhone,
        scalar_diff(
            baseline.and_then(Entity::first_phone).map(str::to_string),
            candidate.first_phone().map(str::to_string),
            has_baseline,
        ),
    );
    set.insert(
        DiffField::EntityTypes,
        set_diff(
            baseline.map(|e| e.entity_types.as_slice()).unwrap_or(&[]),
            &candidate.entity_types,
            has_baseline,
        ),
    );
    set.insert(
        DiffField::Website,
        scalar_diff(
            baseline.map(|e| e.web_site.clone()),
            candidate.web_site.clone(),
            has_baseline,
        ),
    );
    set.insert(
        DiffField::Description,
        scalar_diff(
            baseline.map(|e| e.description.clone()),
            candidate.description.clone(),
            has_baseline,
        ),
    );
    set.insert(
        DiffField::AddressPublic,
        bool_diff(
            address.map(|a| a.is_public),
            candidate.address_public,
            has_baseline,
        ),
    );

    set
}

fn display_or_not_filled(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => NOT_FILLED.to_string(),
    }
}

fn scalar_diff(baseline: Option<String>, proposed: Option<String>, compare: bool) -> FieldDiff {
    let changed = compare
        && match proposed.as_deref() {
            Some(candidate) if !candidate.trim().is_empty() => match baseline.as_deref() {
                Some(current) => current.trim() != candidate.trim(),
                None => true,
            },
            _ => false,
        };
    let previous_display = changed.then(|| display_or_not_filled(baseline.as_deref()));

    FieldDiff {
        baseline,
        proposed,
        changed,
        previous_display,
    }
}

fn bool_diff(baseline: Option<bool>, proposed: Option<bool>, compare: bool) -> FieldDiff {
    let changed = compare && proposed.is_some() && baseline != proposed;
    let render = |flag: bool| if flag { "Yes" } else { "No" }.to_string();

    let baseline_str = baseline.map(render);
    let previous_display = changed.then(|| display_or_not_filled(baseline_str.as_deref()));

    FieldDiff {
        baseline: baseline_str,
        proposed: proposed.map(render),
        changed,
        previous_display,
    }
}

fn set_diff(baseline: &[String], proposed: &[String], compare: bool) -> FieldDiff {
    let changed = compare && !proposed.is_empty() && {
        let current: BTreeSet<&str> = baseline.iter().map(|s| s.trim()).collect();
        let candidate: BTreeSet<&str> = proposed.iter().map(|s| s.trim()).collect();
        current != candidate
    };

    let baseline_str = (!baseline.is_empty()).then(|| baseline.join(", "));
    let previous_display = changed.then(|| display_or_not_filled(baseline_str.as_deref()));

    FieldDiff {
        baseline: baseline_str,
        proposed: (!proposed.is_empty()).then(|| proposed.join(", ")),
        changed,
        previous_display,
    }
}
