pub mod builtin;
pub mod descriptor;
pub mod executor;
pub mod overrides;
pub mod registry;
pub mod score;

use crate::error::RuleError;
use crate::snapshot::TenantSnapshot;

pub use descriptor::{MatchResult, RuleComputation, RuleDescriptor};
pub use executor::{ExecutorOptions, RuleFailure, RunOutcome};
pub use overrides::{CustomRuleOverride, OverrideReport, UnknownOverride};
pub use registry::{CatalogEntry, RuleCatalog, RuleRegistration, RuleRegistry};
pub use score::{ScoreSummary, MATURITY_CEILING};

/// A rule inspects a `TenantSnapshot` and decides whether its risk holds.
///
/// Rules are stateless: everything a run records goes into the `RuleDetails`
/// handed to `analyze`, which is fresh for every call.
pub trait Rule: Send + Sync {
    /// Compiled default metadata (id, title, computations, maturity).
    fn descriptor(&self) -> RuleDescriptor;

    /// Analyze the snapshot, recording evidence into `details`.
    ///
    /// Return `Ok(None)` to score from the recorded evidence through the
    /// descriptor's computations, or `Ok(Some(points))` to contribute an
    /// explicit point value instead.
    fn analyze(
        &self,
        snapshot: &TenantSnapshot,
        details: &mut RuleDetails,
    ) -> Result<Option<u32>, RuleError>;
}

/// Evidence recorded by one rule during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleDetails {
    entries: Vec<String>,
}

impl RuleDetails {
    pub fn add(&mut self, detail: impl Into<String>) {
        self.entries.push(detail.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.entries
    }
}

/// Result of one evaluation run over the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Evaluation {
    /// Triggered rules in catalog order.
    pub matches: Vec<MatchResult>,
    /// Rules whose analysis failed; excluded from `matches`.
    pub failures: Vec<RuleFailure>,
    /// Rules not run because the deadline passed.
    pub skipped: Vec<String>,
    pub score: ScoreSummary,
}
