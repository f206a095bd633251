use crate::error::RuleError;
use crate::rules::{Rule, RuleComputation, RuleDescriptor, RuleDetails};
use crate::snapshot::TenantSnapshot;

/// UserRegisterApplications: any user can register applications
#[derive(Debug, Default)]
pub struct UserRegisterApplications;

impl Rule for UserRegisterApplications {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            risk_id: "UserRegisterApplications".into(),
            title: "Users can register applications".into(),
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
        if snapshot.user_settings.users_can_register_apps == Some(true) {
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
    fn flags_open_registration() {
        let mut details = RuleDetails::default();
        UserRegisterApplications
            .analyze(&with_settings(None, Some(true)), &mut details)
            .unwrap();
        assert_eq!(details.len(), 1);
    }

    #[test]
    fn closed_registration_is_clean() {
        let mut details = RuleDetails::default();
        UserRegisterApplications
            .analyze(&with_settings(Some(true), Some(false)), &mut details)
            .unwrap();
        assert!(details.is_empty());
    }
}
