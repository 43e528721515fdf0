//! Synthesis narrative and executive evaluation types.

use super::divergence::{ConsensusPoint, Divergence};
use super::harmonize::HarmonizedScores;
use crate::reader::persona::Dimension;
use serde::{Deserialize, Serialize};

/// Confidence in the harmonized report, derived from divergence count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// `High` for 0 divergences, `Medium` for 1-2, `Low` for 3 or more.
    pub fn from_divergence_count(count: usize) -> Self {
        match count {
            0 => ConfidenceLevel::High,
            1..=2 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build the short prose summary combining consensus points, divergences,
/// and per-dimension percentile context.
pub fn build_narrative(
    harmonized: &HarmonizedScores,
    consensus: &[ConsensusPoint],
    divergences: &[Divergence],
) -> String {
    let mut narrative = String::new();

    if let Some(overall) = harmonized.get(&Dimension::Overall) {
        narrative.push_str(&format!(
            "The panel rates this manuscript {} overall ({}/100, {}th percentile against prior submissions).",
            overall.rating, overall.score, overall.percentile
        ));
    }

    if !consensus.is_empty() {
        let statements: Vec<&str> = consensus
            .iter()
            .take(3)
            .map(|p| p.statement.as_str())
            .collect();
        narrative.push_str(&format!(" Readers agreed on: {}.", statements.join("; ")));
    }

    if divergences.is_empty() {
        narrative.push_str(" No material disagreement surfaced.");
    } else {
        let topics: Vec<&str> = divergences.iter().map(|d| d.topic.as_str()).collect();
        narrative.push_str(&format!(
            " The panel diverged on {} ({}).",
            topics.join(", "),
            divergences
                .first()
                .map(|d| d.synthesis.as_str())
                .unwrap_or_default()
        ));
    }

    narrative
}

/// The executive's simulated business verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pursue,
    Pass,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pursue => write!(f, "pursue"),
            Verdict::Pass => write!(f, "pass"),
        }
    }
}

/// One simulated industry decision-maker's verdict, computed only against
/// the finished harmonized coverage, never against raw reader text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveEvaluation {
    pub verdict: Verdict,
    /// 0-100
    pub confidence: u8,
    pub rationale: String,
    pub key_factors: Vec<String>,
    pub concerns: Vec<String>,
    pub citations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::analysis::Rating;
    use crate::scoring::harmonize::HarmonizedScore;
    use std::collections::BTreeMap;

    #[test]
    fn test_confidence_from_divergence_count() {
        assert_eq!(ConfidenceLevel::from_divergence_count(0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_divergence_count(1), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_divergence_count(2), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_divergence_count(3), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_divergence_count(7), ConfidenceLevel::Low);
    }

    #[test]
    fn test_narrative_mentions_overall_and_divergence() {
        let mut harmonized = BTreeMap::new();
        harmonized.insert(
            Dimension::Overall,
            HarmonizedScore {
                rating: Rating::Good,
                score: 72,
                percentile: 64,
            },
        );
        let divergences = vec![Divergence {
            topic: "Overall".to_string(),
            positions: vec![],
            synthesis: "Overall scored a highest and c lowest, a 37-point spread".to_string(),
        }];
        let narrative = build_narrative(&harmonized, &[], &divergences);
        assert!(narrative.contains("72/100"));
        assert!(narrative.contains("64th percentile"));
        assert!(narrative.contains("diverged on Overall"));
    }

    #[test]
    fn test_narrative_without_divergence() {
        let narrative = build_narrative(&BTreeMap::new(), &[], &[]);
        assert!(narrative.contains("No material disagreement"));
    }
}
