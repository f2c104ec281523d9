//! Directory entity records and the sparse change-request payload.
//!
//! [`Entity`] is the durable record as the store returns it. [`EntityDraft`]
//! is the candidate payload a change-request session edits: every scalar is
//! optional and an absent or empty value means "no change requested", which
//! is what keeps a pre-filled edit form from appearing to erase fields.

use chrono::{DateTime, TimeZone, Utc};

use crate::config::DEFAULT_COUNTRY_CODE;
use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Phone,
    Email,
}

/// A single contact channel. The variant carries the one value matching its
/// kind, so a phone entry can never hold an email address.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub enum ContactMethod {
    #[n(0)]
    Phone {
        #[n(0)]
        number: String,
        #[n(1)]
        is_public: bool,
    },
    #[n(1)]
    Email {
        #[n(0)]
        address: String,
        #[n(1)]
        is_public: bool,
    },
}

impl ContactMethod {
    pub fn phone(number: impl Into<String>, is_public: bool) -> Self {
        Self::Phone {
            number: number.into(),
            is_public,
        }
    }

    pub fn email(address: impl Into<String>, is_public: bool) -> Self {
        Self::Email {
            address: address.into(),
            is_public,
        }
    }

    pub fn kind(&self) -> ContactKind {
        match self {
            Self::Phone { .. } => ContactKind::Phone,
            Self::Email { .. } => ContactKind::Email,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Phone { number, .. } => number,
            Self::Email { address, .. } => address,
        }
    }

    pub fn is_public(&self) -> bool {
        match self {
            Self::Phone { is_public, .. } | Self::Email { is_public, .. } => *is_public,
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    #[n(0)]
    pub street_address: String,
    #[n(1)]
    pub city: String,
    #[n(2)]
    pub state: String,
    #[n(3)]
    pub postal_code: String,
    #[n(4)]
    pub country: String,
    #[n(5)]
    pub is_public: bool,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    #[n(0)]
    Local,
    #[n(1)]
    Regional,
    #[n(2)]
    National,
    #[n(3)]
    International,
}

impl Default for Scope {
    fn default() -> Self {
        Self::Local
    }
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Regional => "Regional",
            Self::National => "National",
            Self::International => "International",
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// The durable directory record. An entity with `id = None` has never been
/// persisted; once the store assigns an identifier it never changes.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Entity {
    #[n(0)]
    pub id: Option<String>,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub addresses: Vec<Address>,
    #[n(3)]
    pub contact_name: String,
    #[n(4)]
    pub contact_name_public: bool,
    #[n(5)]
    pub contact_methods: Vec<ContactMethod>,
    // one or more links, comma separated
    #[n(6)]
    pub web_site: String,
    #[n(7)]
    pub entity_types: Vec<String>,
    #[n(8)]
    pub description: String,
    #[n(9)]
    pub scope: Scope,
    #[n(10)]
    pub tags: String,
    #[n(11)]
    pub enabled: bool,
    /// The pending proposed change awaiting review, at most one. A newer
    /// proposal replaces it (last write wins).
    #[n(12)]
    pub proposed_changes: Option<EntityDraft>,
    #[n(13)]
    pub rec_updated: TimeStamp<Utc>,
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity {
    pub fn new() -> Self {
        Self {
            id: None,
            name: String::new(),
            addresses: Vec::new(),
            contact_name: String::new(),
            contact_name_public: true,
            contact_methods: Vec::new(),
            web_site: String::new(),
            entity_types: Vec::new(),
            description: String::new(),
            scope: Scope::default(),
            tags: String::new(),
            enabled: true,
            proposed_changes: None,
            rec_updated: TimeStamp::new(),
        }
    }

    pub fn first_address(&self) -> Option<&Address> {
        self.addresses.first()
    }

    pub fn first_email(&self) -> Option<&str> {
        self.contact_methods
            .iter()
            .find(|m| m.kind() == ContactKind::Email)
            .map(ContactMethod::value)
    }

    pub fn first_phone(&self) -> Option<&str> {
        self.contact_methods
            .iter()
            .find(|m| m.kind() == ContactKind::Phone)
            .map(ContactMethod::value)
    }

    /// The website field split into individual links.
    pub fn websites(&self) -> Vec<&str> {
        self.web_site
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Apply every value the draft carries onto this record. Absent draft
    /// fields leave the current values in place; this is both how a create
    /// materializes a record and how an approval lands proposed values.
    pub fn apply_draft(&mut self, draft: &EntityDraft) {
        if let Some(name) = &draft.name {
            self.name = name.clone();
        }
        if let Some(contact_name) = &draft.contact_name {
            self.contact_name = contact_name.clone();
        }
        if let Some(public) = draft.contact_name_public {
            self.contact_name_public = public;
        }
        if let Some(web_site) = &draft.web_site {
            self.web_site = web_site.clone();
        }
        if let Some(description) = &draft.description {
            self.description = description.clone();
        }
        if let Some(scope) = draft.scope {
            self.scope = scope;
        }
        if let Some(tags) = &draft.tags {
            self.tags = tags.clone();
        }
        if !draft.contact_methods.is_empty() {
            self.contact_methods = draft.contact_methods.clone();
        }
        if !draft.entity_types.is_empty() {
            self.entity_types = draft.entity_types.clone();
        }

        if draft.street.is_some()
            || draft.city.is_some()
            || draft.state.is_some()
            || draft.postal_code.is_some()
            || draft.country.is_some()
            || draft.address_public.is_some()
        {
            if self.addresses.is_empty() {
                self.addresses.push(Address {
                    country: DEFAULT_COUNTRY_CODE.to_string(),
                    is_public: true,
                    ..Address::default()
                });
            }
            let address = &mut self.addresses[0];
            if let Some(street) = &draft.street {
                address.street_address = street.clone();
            }
            if let Some(city) = &draft.city {
                address.city = city.clone();
            }
            if let Some(state) = &draft.state {
                address.state = state.clone();
            }
            if let Some(postal_code) = &draft.postal_code {
                address.postal_code = postal_code.clone();
            }
            if let Some(country) = &draft.country {
                address.country = country.clone();
            }
            if let Some(public) = draft.address_public {
                address.is_public = public;
            }
        }
    }
}

/// The candidate payload for a change request. Also the wire shape of a
/// pending proposed change: a sparse mirror of [`Entity`] with the nested
/// address flattened into individual fields.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq)]
pub struct EntityDraft {
    #[n(0)]
    pub name: Option<String>,
    #[n(1)]
    pub street: Option<String>,
    #[n(2)]
    pub city: Option<String>,
    #[n(3)]
    pub state: Option<String>,
    #[n(4)]
    pub postal_code: Option<String>,
    #[n(5)]
    pub country: Option<String>,
    #[n(6)]
    pub address_public: Option<bool>,
    #[n(7)]
    pub web_site: Option<String>,
    #[n(8)]
    pub contact_name: Option<String>,
    #[n(9)]
    pub contact_name_public: Option<bool>,
    #[n(10)]
    pub contact_methods: Vec<ContactMethod>,
    #[n(11)]
    pub entity_types: Vec<String>,
    #[n(12)]
    pub description: Option<String>,
    #[n(13)]
    pub scope: Option<Scope>,
    #[n(14)]
    pub tags: Option<String>,
}

impl EntityDraft {
    /// Construct an empty draft, the basis of a create-mode session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a draft from a loaded record, the way an edit form pre-fills
    /// its inputs from the baseline.
    pub fn from_entity(entity: &Entity) -> Self {
        let address = entity.first_address();
        Self {
            name: Some(entity.name.clone()),
            street: address.map(|a| a.street_address.clone()),
            city: address.map(|a| a.city.clone()),
            state: address.map(|a| a.state.clone()),
            postal_code: address.map(|a| a.postal_code.clone()),
            country: address.map(|a| a.country.clone()),
            address_public: address.map(|a| a.is_public),
            web_site: Some(entity.web_site.clone()),
            contact_name: Some(entity.contact_name.clone()),
            contact_name_public: Some(entity.contact_name_public),
            contact_methods: entity.contact_methods.clone(),
            entity_types: entity.entity_types.clone(),
            description: Some(entity.description.clone()),
            scope: Some(entity.scope),
            tags: Some(entity.tags.clone()),
        }
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn set_street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }
    pub fn set_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }
    pub fn set_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
    pub fn set_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }
    pub fn set_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
    pub fn set_address_public(mut self, is_public: bool) -> Self {
        self.address_public = Some(is_public);
        self
    }
    pub fn set_web_site(mut self, web_site: impl Into<String>) -> Self {
        self.web_site = Some(web_site.into());
        self
    }
    pub fn set_contact_name(mut self, contact_name: impl Into<String>) -> Self {
        self.contact_name = Some(contact_name.into());
        self
    }
    pub fn set_contact_name_public(mut self, is_public: bool) -> Self {
        self.contact_name_public = Some(is_public);
        self
    }
    pub fn add_contact_method(mut self, method: ContactMethod) -> Self {
        self.contact_methods.push(method);
        self
    }
    pub fn set_entity_types(mut self, types: Vec<String>) -> Self {
        self.entity_types = types;
        self
    }
    pub fn add_entity_type(mut self, name: impl Into<String>) -> Self {
        self.entity_types.push(name.into());
        self
    }
    pub fn set_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
    pub fn set_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }
    pub fn set_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn first_email(&self) -> Option<&str> {
        self.contact_methods
            .iter()
            .find(|m| m.kind() == ContactKind::Email)
            .map(ContactMethod::value)
    }

    pub fn first_phone(&self) -> Option<&str> {
        self.contact_methods
            .iter()
            .find(|m| m.kind() == ContactKind::Phone)
            .map(ContactMethod::value)
    }

    /// Lay another draft's values over this one. Used when an approve-mode
    /// session seeds its form: the baseline seed first, then the proposed
    /// values where the proposal carries them.
    pub fn overlay(mut self, proposed: &EntityDraft) -> Self {
        if proposed.name.is_some() {
            self.name = proposed.name.clone();
        }
        if proposed.street.is_some() {
            self.street = proposed.street.clone();
        }
        if proposed.city.is_some() {
            self.city = proposed.city.clone();
        }
        if proposed.state.is_some() {
            self.state = proposed.state.clone();
        }
        if proposed.postal_code.is_some() {
            self.postal_code = proposed.postal_code.clone();
        }
        if proposed.country.is_some() {
            self.country = proposed.country.clone();
        }
        if proposed.address_public.is_some() {
            self.address_public = proposed.address_public;
        }
        if proposed.web_site.is_some() {
            self.web_site = proposed.web_site.clone();
        }
        if proposed.contact_name.is_some() {
            self.contact_name = proposed.contact_name.clone();
        }
        if proposed.contact_name_public.is_some() {
            self.contact_name_public = proposed.contact_name_public;
        }
        if !proposed.contact_methods.is_empty() {
            self.contact_methods = proposed.contact_methods.clone();
        }
        if !proposed.entity_types.is_empty() {
            self.entity_types = proposed.entity_types.clone();
        }
        if proposed.description.is_some() {
            self.description = proposed.description.clone();
        }
        if proposed.scope.is_some() {
            self.scope = proposed.scope;
        }
        if proposed.tags.is_some() {
            self.tags = proposed.tags.clone();
        }
        self
    }

    // Serialize to cbor and return the content hash with the encoding.
    // The hash keys the pending payload in the store.
    pub fn finalise(&self) -> anyhow::Result<(String, Vec<u8>)> {
        let contents = minicbor::to_vec(self)?;
        let hash = utils::content_hash(&contents);

        Ok((hash, contents))
    }
}
