//! Session-static reference catalogs: countries, provinces, entity types.
//!
//! These are read-through lookups loaded once per session. The editor never
//! refreshes them while open, so plain owned lists are enough.

use std::collections::BTreeMap;

/// One catalog row: a stable code and the label shown in drop-downs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefItem {
    pub code: String,
    pub display_name: String,
}

impl RefItem {
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceDirectory {
    countries: Vec<RefItem>,
    provinces: BTreeMap<String, Vec<RefItem>>,
    entity_types: Vec<RefItem>,
}

impl ReferenceDirectory {
    pub fn new(
        countries: Vec<RefItem>,
        provinces: BTreeMap<String, Vec<RefItem>>,
        entity_types: Vec<RefItem>,
    ) -> Self {
        Self {
            countries,
            provinces,
            entity_types,
        }
    }

    /// The stock catalog: US country list, US state codes, and the
    /// predefined entity-type names ordered by name.
    pub fn with_defaults() -> Self {
        let countries = vec![RefItem::new("US", "United States")];

        let us_states: Vec<RefItem> = US_STATES
            .iter()
            .map(|(code, name)| RefItem::new(*code, *name))
            .collect();
        let mut provinces = BTreeMap::new();
        provinces.insert("US".to_string(), us_states);

        let entity_types = ENTITY_TYPES
            .iter()
            .map(|name| RefItem::new(*name, *name))
            .collect();

        Self::new(countries, provinces, entity_types)
    }

    pub fn list_countries(&self) -> &[RefItem] {
        &self.countries
    }

    /// Province list for a country code, `None` when the country is unknown.
    pub fn list_provinces(&self, country_code: &str) -> Option<&[RefItem]> {
        self.provinces.get(country_code).map(Vec::as_slice)
    }

    pub fn list_entity_types(&self) -> &[RefItem] {
        &self.entity_types
    }

    /// True when `code` belongs to the province list of `country_code`.
    pub fn has_province(&self, country_code: &str, code: &str) -> bool {
        self.list_provinces(country_code)
            .is_some_and(|provinces| provinces.iter().any(|p| p.code == code))
    }
}

const US_STATES: &[(&str, &str)] = &[
    ("AK", "Alaska"),
    ("AL", "Alabama"),
    ("AR", "Arkansas"),
    ("AS", "American Samoa"),
    ("AZ", "Arizona"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DC", "District of Columbia"),
    ("DE", "Delaware"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("GU", "Guam"),
    ("HI", "Hawaii"),
    ("IA", "Iowa"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("MA", "Massachusetts"),
    ("MD", "Maryland"),
    ("ME", "Maine"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MO", "Missouri"),
    ("MP", "Northern Mariana Islands"),
    ("MS", "Mississippi"),
    ("MT", "Montana"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("NE", "Nebraska"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NV", "Nevada"),
    ("NY", "New York"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UM", "United States Minor Outlying Islands"),
    ("UT", "Utah"),
    ("VA", "Virginia"),
    ("VI", "Virgin Islands"),
    ("VT", "Vermont"),
    ("WA", "Washington"),
    ("WI", "Wisconsin"),
    ("WV", "West Virginia"),
    ("WY", "Wyoming"),
];

// ordered by name, matching the catalog endpoint
const ENTITY_TYPES: &[&str] = &[
    "Arts/Entertainment Co-op",
    "Childcare Co-op",
    "Consumer Co-op",
    "Credit Union",
    "Food Co-op",
    "Housing Co-op",
    "Marketing Co-op",
    "Multi-stakeholder Co-op",
    "Producer Co-op",
    "Utility Co-op",
    "Worker Co-op",
];
