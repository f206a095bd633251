use serde::{Deserialize, Serialize};

use super::registry::RuleCatalog;
use super::MatchResult;
use crate::snapshot::TenantSnapshot;

/// Maturity level reported when no triggered rule lowers it.
pub const MATURITY_CEILING: i32 = 5;

/// Tenant-level score and maturity for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub global_score: u32,
    pub maturity_level: i32,
}

impl ScoreSummary {
    /// Write the summary onto the snapshot. No other field is touched.
    pub fn write_to(&self, snapshot: &mut TenantSnapshot) {
        snapshot.global_score = self.global_score;
        snapshot.maturity_level = self.maturity_level;
    }
}

/// Sum the points of `matches` and take the lowest positive maturity level.
///
/// Maturity is looked up through the catalog's current descriptor, not the
/// value captured in the match, so later overrides are honoured. Matches
/// unknown to the catalog still add points.
pub fn aggregate(catalog: &RuleCatalog, matches: &[MatchResult]) -> ScoreSummary {
    let mut summary = ScoreSummary {
        global_score: 0,
        maturity_level: MATURITY_CEILING,
    };

    for matched in matches {
        summary.global_score = summary.global_score.saturating_add(matched.points);

        if let Some(descriptor) = catalog.descriptor(&matched.risk_id) {
            let level = descriptor.maturity_level;
            if level > 0 && level < summary.maturity_level {
                summary.maturity_level = level;
            }
        }
    }

    summary
}
