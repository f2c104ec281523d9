//! Session configuration for the directory editor.

use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNTRY_CODE: &str = "US";
pub const DEFAULT_STATE_CODE: &str = "IL";

/// Defaults used to seed a create-mode draft. Loaded once per session;
/// reference catalogs and the store consult the same country default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub default_country: String,
    pub default_state: String,
    /// Initial value for the public-visibility drop-downs.
    pub default_is_public: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            default_country: DEFAULT_COUNTRY_CODE.to_string(),
            default_state: DEFAULT_STATE_CODE.to_string(),
            default_is_public: true,
        }
    }
}
