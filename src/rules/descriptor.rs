use serde::{Deserialize, Serialize};

/// Identity and scoring metadata of a rule.
///
/// Built once per catalog from the rule's compiled defaults; only the
/// override resolver changes it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    /// Unique rule identifier (e.g., "ADConnectVersion").
    pub risk_id: String,
    /// Human-readable title shown in reports.
    pub title: String,
    /// Trigger variants and the points each one is worth.
    pub computations: Vec<RuleComputation>,
    /// Lower is more urgent. Zero or negative means not applicable.
    pub maturity_level: i32,
    /// MITRE ATT&CK technique identifier (if applicable).
    pub mitre_id: Option<String>,
}

impl RuleDescriptor {
    /// Points of the first declared computation.
    pub fn base_points(&self) -> u32 {
        self.computations.first().map(|c| c.points()).unwrap_or(0)
    }

    /// Points earned for `measure` discoveries, or `None` if no computation
    /// matches. Computations with higher thresholds are tried first.
    ///
    /// A descriptor without computations scores 0 for any non-empty measure.
    pub fn resolve_points(&self, measure: usize) -> Option<u32> {
        if measure == 0 {
            return None;
        }
        if self.computations.is_empty() {
            return Some(0);
        }
        let measure = u32::try_from(measure).unwrap_or(u32::MAX);

        let mut ordered: Vec<&RuleComputation> = self.computations.iter().collect();
        ordered.sort_by(|a, b| b.threshold().cmp(&a.threshold()));
        ordered.into_iter().find_map(|c| c.points_for(measure))
    }

    pub fn has_maturity(&self) -> bool {
        self.maturity_level > 0
    }
}

/// How a rule turns its measure (number of discoveries) into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleComputation {
    /// Any discovery earns `points`.
    TriggerOnPresence { points: u32 },
    /// At least `threshold` discoveries earn `points`.
    TriggerOnThreshold { threshold: u32, points: u32 },
    /// Each discovery earns `points`.
    PerDiscover { points: u32 },
    /// Each discovery earns `points`, with `threshold` as the floor.
    PerDiscoverWithAMinimumOf { threshold: u32, points: u32 },
}

impl RuleComputation {
    pub fn points(&self) -> u32 {
        match *self {
            Self::TriggerOnPresence { points }
            | Self::TriggerOnThreshold { points, .. }
            | Self::PerDiscover { points }
            | Self::PerDiscoverWithAMinimumOf { points, .. } => points,
        }
    }

    pub fn threshold(&self) -> u32 {
        match *self {
            Self::TriggerOnThreshold { threshold, .. }
            | Self::PerDiscoverWithAMinimumOf { threshold, .. } => threshold,
            Self::TriggerOnPresence { .. } | Self::PerDiscover { .. } => 0,
        }
    }

    fn points_for(&self, measure: u32) -> Option<u32> {
        match *self {
            Self::TriggerOnPresence { points } => (measure > 0).then_some(points),
            Self::TriggerOnThreshold { threshold, points } => {
                (measure >= threshold).then_some(points)
            }
            Self::PerDiscover { points } => {
                (measure > 0).then(|| measure.saturating_mul(points))
            }
            Self::PerDiscoverWithAMinimumOf { threshold, points } => {
                (measure > 0).then(|| measure.saturating_mul(points).max(threshold))
            }
        }
    }
}

impl std::fmt::Display for RuleComputation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TriggerOnPresence { points } => write!(f, "{points} on presence"),
            Self::TriggerOnThreshold { threshold, points } => {
                write!(f, "{points} from {threshold}")
            }
            Self::PerDiscover { points } => write!(f, "{points} each"),
            Self::PerDiscoverWithAMinimumOf { threshold, points } => {
                write!(f, "{points} each (min {threshold})")
            }
        }
    }
}

/// Outcome of one triggered rule in one evaluation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub risk_id: String,
    pub title: String,
    /// Points this rule contributes to the global score.
    pub points: u32,
    /// Maturity level of the rule when it matched.
    pub maturity_level: i32,
    /// Why the rule triggered.
    pub evidence: Vec<String>,
}
