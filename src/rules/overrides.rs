use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::registry::RuleCatalog;
use super::RuleComputation;

/// Operator customisation of one rule, loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRuleOverride {
    pub risk_id: String,
    /// Replaces the rule's computations entirely when present.
    #[serde(default)]
    pub computations: Option<Vec<RuleComputation>>,
    /// Replaces the rule's maturity level when nonzero.
    #[serde(default)]
    pub maturity_level: i32,
}

/// An override whose risk id is not in the catalog. Reported, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("Rule computation does not match an existing ID ({risk_id})")]
pub struct UnknownOverride {
    pub risk_id: String,
    /// Closest existing risk id, when one is near enough to be a typo.
    pub suggestion: Option<String>,
}

/// What `apply` did with each override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideReport {
    pub applied: Vec<String>,
    pub unknown: Vec<UnknownOverride>,
}

/// Largest edit distance still reported as a likely typo.
const SUGGESTION_DISTANCE: usize = 3;

/// Merge overrides into the catalog in place, in order.
pub fn apply(catalog: &mut RuleCatalog, overrides: &[CustomRuleOverride]) -> OverrideReport {
    let mut report = OverrideReport::default();

    for custom in overrides {
        let Some(entry) = catalog.get_mut(&custom.risk_id) else {
            let unknown = UnknownOverride {
                risk_id: custom.risk_id.clone(),
                suggestion: closest_risk_id(catalog, &custom.risk_id),
            };
            warn!(
                risk_id = %custom.risk_id,
                suggestion = unknown.suggestion.as_deref().unwrap_or("-"),
                "override does not match an existing rule, skipping"
            );
            report.unknown.push(unknown);
            continue;
        };

        let descriptor = entry.descriptor_mut();
        if let Some(computations) = &custom.computations {
            descriptor.computations = computations.clone();
        }
        if custom.maturity_level != 0 {
            descriptor.maturity_level = custom.maturity_level;
        }
        debug!(risk_id = %custom.risk_id, "override applied");
        report.applied.push(custom.risk_id.clone());
    }

    report
}

fn closest_risk_id(catalog: &RuleCatalog, risk_id: &str) -> Option<String> {
    let wanted = risk_id.to_lowercase();
    catalog
        .risk_ids()
        .map(|id| (levenshtein::levenshtein(&wanted, &id.to_lowercase()), id))
        .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, id)| id.to_string())
}
