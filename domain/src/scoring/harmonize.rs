//! Evidence-weighted score harmonization.
//!
//! Merges N readers' structured score sets into one consensus score per
//! dimension, weighting each reader by reported evidence strength times the
//! persona's per-dimension multiplier, then attaches percentile context from
//! the historical distribution.

use super::calibration::{DEFAULT_PERCENTILE, ScoreHistory};
use crate::reader::analysis::{AnalysisResult, Rating};
use crate::reader::persona::{Dimension, ReaderPersona};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from the harmonization step
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Cannot harmonize zero analysis results")]
    NoResults,

    #[error("No usable weight for dimension {0}")]
    ZeroWeight(Dimension),
}

/// Consensus score for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmonizedScore {
    /// Categorical rating derived from the weighted numeric average
    pub rating: Rating,
    /// Weighted numeric average, rounded to an integer
    pub score: u8,
    /// Rank within the historical distribution (50 when no history)
    pub percentile: u8,
}

/// The full consensus score set, keyed by dimension.
pub type HarmonizedScores = BTreeMap<Dimension, HarmonizedScore>;

/// Weighted numeric average over (score, weight) samples, rounded.
///
/// Order of samples never affects the result.
fn weighted_average(samples: &[(u8, f64)]) -> Option<u8> {
    let total_weight: f64 = samples.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return None;
    }
    let weighted_sum: f64 = samples.iter().map(|(s, w)| *s as f64 * w).sum();
    Some((weighted_sum / total_weight).round() as u8)
}

/// Merge analysis results into one harmonized score per dimension.
///
/// Each reader's weight on a dimension is `evidence_strength *
/// persona_multiplier`; readers without a configured persona fall back to a
/// multiplier of 1.0. Dimensions a reader left unscored are skipped for that
/// reader only.
pub fn harmonize(
    analyses: &[AnalysisResult],
    personas: &[ReaderPersona],
    history: Option<&ScoreHistory>,
) -> Result<HarmonizedScores, ScoringError> {
    if analyses.is_empty() {
        return Err(ScoringError::NoResults);
    }

    let mut harmonized = BTreeMap::new();
    for dimension in Dimension::all() {
        let samples: Vec<(u8, f64)> = analyses
            .iter()
            .filter_map(|analysis| {
                let score = analysis.score(dimension)?;
                let multiplier = personas
                    .iter()
                    .find(|p| p.id == analysis.reader)
                    .map(|p| p.weights.get(dimension))
                    .unwrap_or(1.0);
                let weight = analysis.evidence_strength as f64 * multiplier;
                Some((score, weight))
            })
            .collect();

        let average = weighted_average(&samples).ok_or(ScoringError::ZeroWeight(dimension))?;
        let percentile = history
            .map(|h| h.percentile(dimension, average))
            .unwrap_or(DEFAULT_PERCENTILE);

        harmonized.insert(
            dimension,
            HarmonizedScore {
                rating: Rating::from_score(average),
                score: average,
                percentile,
            },
        );
    }

    Ok(harmonized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::analysis::{DimensionScore, Recommendation};
    use crate::reader::persona::ReaderId;

    fn analysis(reader: &str, overall: u8, evidence: u8) -> AnalysisResult {
        let mut scores = BTreeMap::new();
        for dimension in Dimension::all() {
            scores.insert(dimension, DimensionScore::new(overall, None));
        }
        AnalysisResult {
            reader: ReaderId::new(reader),
            scores,
            recommendation: Recommendation::Consider,
            strengths: vec!["strength".to_string()],
            concerns: vec!["concern".to_string()],
            standout_quote: None,
            evidence_strength: evidence,
        }
    }

    #[test]
    fn test_zero_results_is_hard_failure() {
        assert!(matches!(
            harmonize(&[], &[], None),
            Err(ScoringError::NoResults)
        ));
    }

    #[test]
    fn test_equal_weight_average() {
        // {92, 68, 55} with equal evidence 100 -> round(215/3) = 72 -> good
        let analyses = vec![
            analysis("a", 92, 100),
            analysis("b", 68, 100),
            analysis("c", 55, 100),
        ];
        let scores = harmonize(&analyses, &[], None).unwrap();
        let overall = scores[&Dimension::Overall];
        assert_eq!(overall.score, 72);
        assert_eq!(overall.rating, Rating::Good);
        assert_eq!(overall.percentile, 50);
    }

    #[test]
    fn test_order_independence() {
        let forward = vec![analysis("a", 92, 80), analysis("b", 60, 40)];
        let reversed = vec![analysis("b", 60, 40), analysis("a", 92, 80)];
        let left = harmonize(&forward, &[], None).unwrap();
        let right = harmonize(&reversed, &[], None).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn test_evidence_weighting() {
        // (90*100 + 50*50) / 150 = 11500/150 = 76.67 -> 77
        let analyses = vec![analysis("a", 90, 100), analysis("b", 50, 50)];
        let scores = harmonize(&analyses, &[], None).unwrap();
        assert_eq!(scores[&Dimension::Overall].score, 77);
        assert_eq!(scores[&Dimension::Overall].rating, Rating::VeryGood);
    }

    #[test]
    fn test_persona_multiplier_applies() {
        use crate::reader::persona::DimensionWeights;
        let personas = vec![
            ReaderPersona::new("a", "A")
                .with_weights(DimensionWeights::uniform().with(Dimension::Overall, 2.0)),
            ReaderPersona::new("b", "B"),
        ];
        // a: weight 200, b: weight 100 -> (90*200 + 60*100)/300 = 80
        let analyses = vec![analysis("a", 90, 100), analysis("b", 60, 100)];
        let scores = harmonize(&analyses, &personas, None).unwrap();
        assert_eq!(scores[&Dimension::Overall].score, 80);
    }

    #[test]
    fn test_percentile_attached_from_history() {
        let history = ScoreHistory::new().with_samples(Dimension::Overall, vec![40, 50, 60, 80]);
        let analyses = vec![analysis("a", 70, 100)];
        let scores = harmonize(&analyses, &[], Some(&history)).unwrap();
        assert_eq!(scores[&Dimension::Overall].percentile, 75);
        // other dimensions have no history -> default 50
        assert_eq!(scores[&Dimension::Premise].percentile, 50);
    }
}
