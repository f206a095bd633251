//! Runs every catalog entry against one snapshot.
//!
//! A failing rule (error or panic) is logged with its full cause chain and
//! left out of the results; the rest of the catalog still runs.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::registry::{CatalogEntry, RuleCatalog};
use super::{MatchResult, RuleDetails};
use crate::error::{error_chain, RuleError};
use crate::snapshot::TenantSnapshot;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutorOptions {
    /// Stop starting new rules once this much time has passed.
    pub deadline: Option<Duration>,
}

/// A rule whose analysis failed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFailure {
    pub risk_id: String,
    pub rule_type: String,
    /// Error message followed by its causes.
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub matches: Vec<MatchResult>,
    pub failures: Vec<RuleFailure>,
    pub skipped: Vec<String>,
}

/// Evaluate the catalog in order against `snapshot`.
pub fn run(catalog: &RuleCatalog, snapshot: &TenantSnapshot, options: &ExecutorOptions) -> RunOutcome {
    let started = Instant::now();
    let mut outcome = RunOutcome::default();

    debug!(rules = catalog.len(), "starting risk rule run");
    for entry in catalog.iter() {
        let risk_id = &entry.descriptor().risk_id;

        if options.deadline.is_some_and(|d| started.elapsed() >= d) {
            outcome.skipped.push(risk_id.clone());
            continue;
        }

        match evaluate_rule(entry, snapshot) {
            Ok(Some(matched)) => {
                debug!(risk_id = %risk_id, points = matched.points, "matched");
                outcome.matches.push(matched);
            }
            Ok(None) => debug!(risk_id = %risk_id, "not matched"),
            Err(err) => {
                let chain = error_chain(&err);
                error!(
                    risk_id = %risk_id,
                    rule_type = entry.rule_type(),
                    error = %chain,
                    "rule analysis failed, excluding it from this run"
                );
                outcome.failures.push(RuleFailure {
                    risk_id: risk_id.clone(),
                    rule_type: entry.rule_type().to_string(),
                    error: chain,
                });
            }
        }
    }

    if !outcome.skipped.is_empty() {
        warn!(skipped = outcome.skipped.len(), "deadline reached, remaining rules skipped");
    }
    debug!(matched = outcome.matches.len(), "risk rule run stopped");
    outcome
}

/// Evaluate a single rule with fresh evidence state.
///
/// Triggers on any recorded evidence or on a nonzero explicit point value.
/// Evidence that no computation scores (a threshold not reached) still
/// triggers, for 0 points.
pub fn evaluate_rule(
    entry: &CatalogEntry,
    snapshot: &TenantSnapshot,
) -> Result<Option<MatchResult>, RuleError> {
    let mut details = RuleDetails::default();
    let explicit = panic::catch_unwind(AssertUnwindSafe(|| {
        entry.rule().analyze(snapshot, &mut details)
    }))
    .map_err(|payload| RuleError::Panicked(panic_message(payload.as_ref())))??;

    let descriptor = entry.descriptor();
    let points = match explicit {
        Some(points) if points > 0 => points,
        _ if details.is_empty() => return Ok(None),
        _ => descriptor.resolve_points(details.len()).unwrap_or(0),
    };

    Ok(Some(MatchResult {
        risk_id: descriptor.risk_id.clone(),
        title: descriptor.title.clone(),
        points,
        maturity_level: descriptor.maturity_level,
        evidence: details.into_inner(),
    }))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".into()
    }
}
