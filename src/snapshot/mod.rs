//! Tenant posture snapshot: the facts collected about one tenant at one point
//! in time, plus the summary fields written back by an evaluation run.
//!
//! Rules only read the fact surfaces. The score aggregator writes
//! `global_score` and `maturity_level`; the caller records `risk_rules`.

pub mod directory_sync;
pub mod user_settings;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{PostureError, Result};
use crate::rules::MatchResult;

pub use directory_sync::{ClientVersion, DirectorySync};
pub use user_settings::UserSettings;

/// Complete tenant snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantSnapshot {
    /// Display name of the tenant (e.g. `contoso.onmicrosoft.com`).
    pub tenant_name: String,
    /// Directory tenant identifier.
    #[serde(default)]
    pub tenant_id: String,
    /// When the collector produced this snapshot.
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    /// On-premises directory synchronisation facts.
    #[serde(default)]
    pub directory_sync: DirectorySync,
    /// Tenant-wide user permission settings.
    #[serde(default)]
    pub user_settings: UserSettings,
    /// Sum of the points of every triggered rule.
    #[serde(default)]
    pub global_score: u32,
    /// Lowest maturity level among triggered rules (5 when clean, 0 before
    /// any evaluation).
    #[serde(default)]
    pub maturity_level: i32,
    /// Triggered rules from the last evaluation.
    #[serde(default)]
    pub risk_rules: Vec<RiskRuleRecord>,
}

/// Persisted form of a triggered rule. Titles are not stored; they are
/// resolved through the rule catalog when a report is regenerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRuleRecord {
    pub risk_id: String,
    pub points: u32,
    #[serde(default)]
    pub details: Vec<String>,
}

impl From<&MatchResult> for RiskRuleRecord {
    fn from(m: &MatchResult) -> Self {
        Self {
            risk_id: m.risk_id.clone(),
            points: m.points,
            details: m.evidence.clone(),
        }
    }
}

impl TenantSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| PostureError::Snapshot {
            file: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Write the snapshot, including its summary fields, as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Replace the stored triggered-rule list with the results of a run.
    pub fn record_matches(&mut self, matches: &[MatchResult]) {
        self.risk_rules = matches.iter().map(RiskRuleRecord::from).collect();
    }
}

/// Hex-encoded SHA-256 of raw snapshot bytes.
pub fn digest(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}
