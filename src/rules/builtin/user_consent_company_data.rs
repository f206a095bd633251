use crate::error::RuleError;
use crate::rules::{Rule, RuleComputation, RuleDescriptor, RuleDetails};
use crate::snapshot::TenantSnapshot;

/// UserConsentCompanyData: users can consent to apps accessing company data
///
/// Illicit consent grants let a phishing app read mail and files without
/// administrator involvement.
#[derive(Debug, Default)]
pub struct UserConsentCompanyData;

impl Rule for UserConsentCompanyData {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            risk_id: "UserConsentCompanyData".into(),
            title: "Users can consent to applications accessing company data".into(),
            computations: vec![RuleComputation::TriggerOnPresence { points: 5 }],
            maturity_level: 2,
            mitre_id: None,
        }
    }

    fn analyze(
        &self,
        snapshot: &TenantSnapshot,
        details: &mut RuleDetails,
    ) -> Result<Option<u32>, RuleError> {
        if snapshot.user_settings.users_can_consent_to_apps == Some(true) {
            details.add("true");
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::test_support::with_settings;

    #[test]
    fn flags_enabled_consent() {
        let mut details = RuleDetails::default();
        UserConsentCompanyData
            .analyze(&with_settings(Some(true), None), &mut details)
            .unwrap();
        assert_eq!(details.iter().collect::<Vec<_>>(), vec!["true"]);
    }

    #[test]
    fn unknown_or_disabled_is_clean() {
        for consent in [None, Some(false)] {
            let mut details = RuleDetails::default();
            UserConsentCompanyData
                .analyze(&with_settings(consent, Some(true)), &mut details)
                .unwrap();
            assert!(details.is_empty());
        }
    }
}
