mod ad_connect_version;
mod ad_connect_version1;
mod user_consent_company_data;
mod user_register_applications;

use super::RuleRegistration;

pub use ad_connect_version::AdConnectVersion;
pub use ad_connect_version1::AdConnectVersion1;
pub use user_consent_company_data::UserConsentCompanyData;
pub use user_register_applications::UserRegisterApplications;

/// Every built-in rule. A rule type that is not listed here is not part of
/// the catalog.
pub fn all_rules() -> Vec<RuleRegistration> {
    vec![
        RuleRegistration::of::<AdConnectVersion>(),
        RuleRegistration::of::<AdConnectVersion1>(),
        RuleRegistration::of::<UserConsentCompanyData>(),
        RuleRegistration::of::<UserRegisterApplications>(),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::snapshot::{DirectorySync, TenantSnapshot, UserSettings};

    pub fn synced(version: &str) -> TenantSnapshot {
        TenantSnapshot {
            tenant_name: "contoso".into(),
            directory_sync: DirectorySync {
                status: Some("Enabled".into()),
                client_version: Some(version.into()),
            },
            ..Default::default()
        }
    }

    pub fn with_settings(consent: Option<bool>, register: Option<bool>) -> TenantSnapshot {
        TenantSnapshot {
            tenant_name: "contoso".into(),
            user_settings: UserSettings {
                users_can_consent_to_apps: consent,
                users_can_register_apps: register,
            },
            ..Default::default()
        }
    }
}
