//! Panel execution phases

use serde::{Deserialize, Serialize};

/// A phase of a panel session, used for progress reporting and event relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Independent reader analysis (parallel fan-out)
    Analysis,
    /// Score harmonization and calibration
    Harmonization,
    /// Moderated focus-group discussion
    FocusGroup,
    /// Executive evaluation of the harmonized coverage
    Executive,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Analysis => "analysis",
            Phase::Harmonization => "harmonization",
            Phase::FocusGroup => "focus_group",
            Phase::Executive => "executive",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
