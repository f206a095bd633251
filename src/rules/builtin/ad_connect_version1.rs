use crate::error::RuleError;
use crate::rules::{Rule, RuleComputation, RuleDescriptor, RuleDetails};
use crate::snapshot::TenantSnapshot;

/// ADConnectVersion1: retired synchronisation client line
///
/// Azure AD Connect 1.x is out of support regardless of build.
#[derive(Debug, Default)]
pub struct AdConnectVersion1;

impl Rule for AdConnectVersion1 {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            risk_id: "ADConnectVersion1".into(),
            title: "Azure AD Connect 1.x is retired".into(),
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
        let sync = &snapshot.directory_sync;
        if sync.is_enabled() && sync.version().is_some_and(|v| v.major == 1) {
            details.add(sync.client_version.clone().unwrap_or_default());
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::test_support::synced;

    #[test]
    fn flags_any_v1_build() {
        let mut details = RuleDetails::default();
        AdConnectVersion1
            .analyze(&synced("1.6.14.2"), &mut details)
            .unwrap();
        assert_eq!(details.len(), 1);
    }

    #[test]
    fn passes_v2() {
        let mut details = RuleDetails::default();
        AdConnectVersion1
            .analyze(&synced("2.0.3.0"), &mut details)
            .unwrap();
        assert!(details.is_empty());
    }
}
