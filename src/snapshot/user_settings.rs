use serde::{Deserialize, Serialize};

/// Tenant-wide default user permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Users may consent to applications accessing company data on their behalf.
    pub users_can_consent_to_apps: Option<bool>,
    /// Users may register (line-of-business) applications.
    pub users_can_register_apps: Option<bool>,
}
