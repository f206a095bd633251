//! tenant-posture: risk rule engine for cloud directory tenants.
//!
//! Evaluates a collected tenant snapshot against a catalog of independent
//! risk rules and reduces the triggered rules to a global score and a
//! maturity level (1 = most urgent, 5 = clean).
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use tenant_posture::{evaluate, EvaluateOptions};
//!
//! let options = EvaluateOptions::default();
//! let report = evaluate(Path::new("./contoso.json"), &options).unwrap();
//! println!(
//!     "Score: {}, Maturity: {}",
//!     report.evaluation.score.global_score, report.evaluation.score.maturity_level
//! );
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod rules;
pub mod snapshot;
pub mod telemetry;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use config::Config;
use error::{PostureError, Result};
use output::OutputFormat;
use rules::{
    Evaluation, ExecutorOptions, MatchResult, RuleRegistry, ScoreSummary, UnknownOverride,
};
use snapshot::TenantSnapshot;

/// Config file looked up next to the snapshot when none is given.
pub const DEFAULT_CONFIG_FILE: &str = ".tenant-posture.toml";

/// Options for an evaluate invocation.
#[derive(Debug, Clone, Default)]
pub struct EvaluateOptions {
    /// Path to config file (defaults to `.tenant-posture.toml` beside the snapshot).
    pub config_path: Option<PathBuf>,
    /// Write the scored snapshot back to its file.
    pub write_back: bool,
}

/// Everything a renderer needs to show the findings of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub run_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub tenant_name: String,
    /// SHA-256 of the snapshot file the run read, when it came from disk.
    pub snapshot_digest: Option<String>,
    /// Rebuilt from a stored snapshot rather than a fresh run.
    pub regenerated: bool,
    pub evaluation: Evaluation,
    pub unknown_overrides: Vec<UnknownOverride>,
}

/// Load a snapshot, apply the configured overrides to the process-wide
/// registry, evaluate, and optionally persist the scored snapshot.
pub fn evaluate(path: &Path, options: &EvaluateOptions) -> Result<EvaluationReport> {
    let config = Config::load(&config_path_for(options.config_path.as_deref(), Some(path)))?;

    let content = std::fs::read(path)?;
    let mut snapshot: TenantSnapshot =
        serde_json::from_slice(&content).map_err(|e| PostureError::Snapshot {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;

    let mut report = evaluate_with(RuleRegistry::global(), &mut snapshot, &config)?;
    report.snapshot_digest = Some(snapshot::digest(&content));

    if options.write_back {
        snapshot.save(path)?;
    }
    Ok(report)
}

/// Evaluate an in-memory snapshot against `registry`.
///
/// The catalog is rebuilt from compiled defaults with `config`'s overrides
/// before the run, so a previous run's config never carries over.
pub fn evaluate_with(
    registry: &RuleRegistry,
    snapshot: &mut TenantSnapshot,
    config: &Config,
) -> Result<EvaluationReport> {
    let overrides = registry.reload_with(&config.custom_rules)?;
    let options = ExecutorOptions {
        deadline: config.executor.deadline(),
    };

    let evaluation = registry.evaluate(snapshot, &options)?;
    snapshot.record_matches(&evaluation.matches);

    Ok(EvaluationReport {
        run_id: Uuid::new_v4(),
        evaluated_at: Utc::now(),
        tenant_name: snapshot.tenant_name.clone(),
        snapshot_digest: None,
        regenerated: false,
        evaluation,
        unknown_overrides: overrides.unknown,
    })
}

/// Rebuild a report from a previously evaluated snapshot file.
pub fn regenerate(path: &Path) -> Result<EvaluationReport> {
    let snapshot = TenantSnapshot::load(path)?;
    regenerate_with(RuleRegistry::global(), &snapshot)
}

/// Rebuild a report from stored results, resolving titles and maturity
/// levels through the catalog. Unknown ids keep their points with an empty
/// title.
pub fn regenerate_with(registry: &RuleRegistry, snapshot: &TenantSnapshot) -> Result<EvaluationReport> {
    let mut matches = Vec::with_capacity(snapshot.risk_rules.len());
    for record in &snapshot.risk_rules {
        let descriptor = registry.rule_from_id(&record.risk_id)?;
        matches.push(MatchResult {
            risk_id: record.risk_id.clone(),
            title: registry.rule_description(&record.risk_id)?,
            points: record.points,
            maturity_level: descriptor.map(|d| d.maturity_level).unwrap_or(0),
            evidence: record.details.clone(),
        });
    }

    Ok(EvaluationReport {
        run_id: Uuid::new_v4(),
        evaluated_at: snapshot.generated_at.unwrap_or_else(Utc::now),
        tenant_name: snapshot.tenant_name.clone(),
        snapshot_digest: None,
        regenerated: true,
        evaluation: Evaluation {
            matches,
            failures: Vec::new(),
            skipped: Vec::new(),
            score: ScoreSummary {
                global_score: snapshot.global_score,
                maturity_level: snapshot.maturity_level,
            },
        },
        unknown_overrides: Vec::new(),
    })
}

/// Render a report in the specified format.
pub fn render_report(report: &EvaluationReport, format: OutputFormat) -> Result<String> {
    output::render(report, format)
}

/// Config file that governs a run: the explicit path if given, otherwise
/// `.tenant-posture.toml` beside the snapshot, otherwise the one in the
/// working directory.
pub fn config_path_for(explicit: Option<&Path>, snapshot_path: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match snapshot_path.and_then(Path::parent) {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(DEFAULT_CONFIG_FILE),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::rules::{CustomRuleOverride, RuleComputation};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn fixture(name: &str) -> TenantSnapshot {
        TenantSnapshot::load(&Path::new("tests/fixtures/snapshots").join(name)).unwrap()
    }

    fn ids(report: &EvaluationReport) -> Vec<&str> {
        report
            .evaluation
            .matches
            .iter()
            .map(|m| m.risk_id.as_str())
            .collect()
    }

    #[test]
    fn hardened_tenant_is_clean() {
        let mut snapshot = fixture("hardened.json");
        let report = evaluate_with(&RuleRegistry::builtin(), &mut snapshot, &Config::default()).unwrap();

        assert!(report.evaluation.matches.is_empty());
        assert_eq!(snapshot.global_score, 0);
        assert_eq!(snapshot.maturity_level, 5);
        assert!(snapshot.risk_rules.is_empty());
    }

    #[test]
    fn exposed_tenant_triggers_every_rule() {
        let mut snapshot = fixture("exposed.json");
        let report = evaluate_with(&RuleRegistry::builtin(), &mut snapshot, &Config::default()).unwrap();

        assert_eq!(
            ids(&report),
            vec![
                "ADConnectVersion",
                "ADConnectVersion1",
                "UserConsentCompanyData",
                "UserRegisterApplications"
            ]
        );
        assert_eq!(snapshot.global_score, 30);
        assert_eq!(snapshot.maturity_level, 1);
        assert_eq!(snapshot.risk_rules.len(), 4);
        assert_eq!(snapshot.risk_rules[0].details, vec!["1.6.4.0".to_string()]);
    }

    #[test]
    fn overrides_change_points_and_maturity() {
        let mut snapshot = fixture("consent_only.json");
        let config = Config {
            custom_rules: vec![
                CustomRuleOverride {
                    risk_id: "DOES-NOT-EXIST".into(),
                    computations: None,
                    maturity_level: 1,
                },
                CustomRuleOverride {
                    risk_id: "UserConsentCompanyData".into(),
                    computations: Some(vec![RuleComputation::TriggerOnPresence { points: 12 }]),
                    maturity_level: 1,
                },
            ],
            ..Default::default()
        };

        let report = evaluate_with(&RuleRegistry::builtin(), &mut snapshot, &config).unwrap();
        assert_eq!(ids(&report), vec!["UserConsentCompanyData"]);
        assert_eq!(report.evaluation.score.global_score, 12);
        assert_eq!(report.evaluation.score.maturity_level, 1);
        assert_eq!(report.unknown_overrides.len(), 1);
        assert_eq!(report.unknown_overrides[0].risk_id, "DOES-NOT-EXIST");
    }

    #[test]
    fn overrides_do_not_carry_over_to_the_next_config() {
        let registry = RuleRegistry::builtin();
        let boosted = Config {
            custom_rules: vec![CustomRuleOverride {
                risk_id: "UserConsentCompanyData".into(),
                computations: Some(vec![RuleComputation::TriggerOnPresence { points: 99 }]),
                maturity_level: 1,
            }],
            ..Default::default()
        };

        let mut snapshot = fixture("consent_only.json");
        let first = evaluate_with(&registry, &mut snapshot, &boosted).unwrap();
        assert_eq!(first.evaluation.score.global_score, 99);
        assert_eq!(first.evaluation.score.maturity_level, 1);

        let mut snapshot = fixture("consent_only.json");
        let second = evaluate_with(&registry, &mut snapshot, &Config::default()).unwrap();
        assert_eq!(second.evaluation.score.global_score, 5);
        assert_eq!(second.evaluation.score.maturity_level, 2);
        assert_eq!(snapshot.global_score, 5);
        assert_eq!(snapshot.maturity_level, 2);
        assert_eq!(snapshot.risk_rules[0].points, 5);
    }

    #[test]
    fn config_path_resolution() {
        let explicit = Path::new("conf/custom.toml");
        let snapshot = Path::new("tenants/contoso.json");

        assert_eq!(
            config_path_for(Some(explicit), Some(snapshot)),
            PathBuf::from("conf/custom.toml")
        );
        assert_eq!(
            config_path_for(None, Some(snapshot)),
            Path::new("tenants").join(DEFAULT_CONFIG_FILE)
        );
        assert_eq!(
            config_path_for(None, Some(Path::new("contoso.json"))),
            PathBuf::from(DEFAULT_CONFIG_FILE)
        );
        assert_eq!(config_path_for(None, None), PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn evaluate_from_file_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exposed.json");
        std::fs::copy("tests/fixtures/snapshots/exposed.json", &path).unwrap();

        let options = EvaluateOptions {
            config_path: None,
            write_back: true,
        };
        let report = evaluate(&path, &options).unwrap();
        assert_eq!(report.tenant_name, "contoso.onmicrosoft.com");
        assert_eq!(report.snapshot_digest.as_ref().map(String::len), Some(64));

        let saved = TenantSnapshot::load(&path).unwrap();
        assert_eq!(saved.global_score, 30);
        assert_eq!(saved.maturity_level, 1);
    }

    #[test]
    fn regenerated_report_resolves_titles() {
        let mut snapshot = fixture("exposed.json");
        let registry = RuleRegistry::builtin();
        let fresh = evaluate_with(&registry, &mut snapshot, &Config::default()).unwrap();
        snapshot.risk_rules.push(crate::snapshot::RiskRuleRecord {
            risk_id: "RetiredRule".into(),
            points: 0,
            details: vec![],
        });

        let regenerated = regenerate_with(&registry, &snapshot).unwrap();
        assert!(regenerated.regenerated);
        assert_eq!(regenerated.evaluation.score, fresh.evaluation.score);
        assert_eq!(
            &regenerated.evaluation.matches[..4],
            &fresh.evaluation.matches[..]
        );
        assert_eq!(regenerated.evaluation.matches[4].title, "");
    }

    #[test]
    fn json_report_round_trips() {
        let mut snapshot = fixture("exposed.json");
        let report = evaluate_with(&RuleRegistry::builtin(), &mut snapshot, &Config::default()).unwrap();
        let json = render_report(&report, OutputFormat::Json).unwrap();
        let parsed: EvaluationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
