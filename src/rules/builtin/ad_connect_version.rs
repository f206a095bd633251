use crate::error::RuleError;
use crate::rules::{Rule, RuleComputation, RuleDescriptor, RuleDetails};
use crate::snapshot::{ClientVersion, TenantSnapshot};

/// Oldest 1.x synchronisation client without known privilege escalation issues.
const MIN_V1: ClientVersion = ClientVersion::new(1, 6, 11, 3);
/// Oldest 2.x synchronisation client without known privilege escalation issues.
const MIN_V2: ClientVersion = ClientVersion::new(2, 0, 8, 0);

/// ADConnectVersion: vulnerable directory synchronisation client
///
/// Flags tenants synchronising from an on-premises directory with an
/// Azure AD Connect build older than the security fixes of its major line.
#[derive(Debug, Default)]
pub struct AdConnectVersion;

impl Rule for AdConnectVersion {
    fn descriptor(&self) -> RuleDescriptor {
        RuleDescriptor {
            risk_id: "ADConnectVersion".into(),
            title: "Azure AD Connect version is vulnerable".into(),
            computations: vec![RuleComputation::TriggerOnPresence { points: 15 }],
            maturity_level: 1,
            mitre_id: Some("T1557".into()),
        }
    }

    fn analyze(
        &self,
        snapshot: &TenantSnapshot,
        details: &mut RuleDetails,
    ) -> Result<Option<u32>, RuleError> {
        let sync = &snapshot.directory_sync;
        if !sync.is_enabled() {
            return Ok(None);
        }
        let Some(version) = sync.version() else {
            return Ok(None);
        };

        let vulnerable = match version.major {
            1 => version < MIN_V1,
            2 => version < MIN_V2,
            _ => false,
        };
        if vulnerable {
            details.add(sync.client_version.clone().unwrap_or_default());
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::builtin::test_support::synced;
    use crate::snapshot::DirectorySync;

    fn evidence(snapshot: &TenantSnapshot) -> Vec<String> {
        let mut details = RuleDetails::default();
        AdConnectVersion.analyze(snapshot, &mut details).unwrap();
        details.into_inner()
    }

    #[test]
    fn flags_old_builds_of_each_line() {
        assert_eq!(evidence(&synced("1.6.4.0")), vec!["1.6.4.0".to_string()]);
        assert_eq!(evidence(&synced("1.5")), vec!["1.5".to_string()]);
        assert_eq!(evidence(&synced("2.0.3.0")), vec!["2.0.3.0".to_string()]);
    }

    #[test]
    fn passes_patched_builds() {
        assert!(evidence(&synced("1.6.11.3")).is_empty());
        assert!(evidence(&synced("1.6.14.2")).is_empty());
        assert!(evidence(&synced("2.0.8.0")).is_empty());
        assert!(evidence(&synced("2.1.1.0")).is_empty());
    }

    #[test]
    fn other_major_lines_are_not_checked() {
        assert!(evidence(&synced("3.0.0.0")).is_empty());
    }

    #[test]
    fn not_applicable_without_sync_or_version() {
        let mut disabled = synced("1.0.0.0");
        disabled.directory_sync.status = Some("Disabled".into());
        assert!(evidence(&disabled).is_empty());

        assert!(evidence(&synced("not-a-version")).is_empty());

        let missing = TenantSnapshot {
            directory_sync: DirectorySync {
                status: Some("Enabled".into()),
                client_version: None,
            },
            ..Default::default()
        };
        assert!(evidence(&missing).is_empty());
    }
}
