//! Percentile calibration against historical score distributions.

use crate::reader::persona::Dimension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Percentile used when no historical distribution exists for a dimension.
pub const DEFAULT_PERCENTILE: u8 = 50;

/// Historical numeric score samples, one set per dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreHistory {
    samples: BTreeMap<Dimension, Vec<u8>>,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one historical score for a dimension.
    pub fn record(&mut self, dimension: Dimension, score: u8) {
        self.samples.entry(dimension).or_default().push(score);
    }

    pub fn with_samples(mut self, dimension: Dimension, scores: Vec<u8>) -> Self {
        self.samples.insert(dimension, scores);
        self
    }

    pub fn samples(&self, dimension: Dimension) -> &[u8] {
        self.samples
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Percentile of `score` within this history for `dimension`.
    pub fn percentile(&self, dimension: Dimension, score: u8) -> u8 {
        percentile(self.samples(dimension), score)
    }
}

/// Rank a score within a historical sample set.
///
/// `round(100 * count(history < score) / len(history))`, defaulting to 50
/// for an empty history.
pub fn percentile(history: &[u8], score: u8) -> u8 {
    if history.is_empty() {
        return DEFAULT_PERCENTILE;
    }
    let below = history.iter().filter(|&&h| h < score).count();
    ((below as f64 / history.len() as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_is_always_fifty() {
        assert_eq!(percentile(&[], 0), 50);
        assert_eq!(percentile(&[], 72), 50);
        assert_eq!(percentile(&[], 100), 50);
    }

    #[test]
    fn test_percentile_counts_strictly_below() {
        let history = [50, 60, 70, 80];
        assert_eq!(percentile(&history, 70), 50); // 2 of 4 below
        assert_eq!(percentile(&history, 71), 75);
        assert_eq!(percentile(&history, 40), 0);
        assert_eq!(percentile(&history, 100), 100);
    }

    #[test]
    fn test_percentile_rounds() {
        let history = [10, 20, 30];
        // 1/3 -> 33.33 -> 33
        assert_eq!(percentile(&history, 15), 33);
        // 2/3 -> 66.67 -> 67
        assert_eq!(percentile(&history, 25), 67);
    }

    #[test]
    fn test_history_per_dimension() {
        let history = ScoreHistory::new().with_samples(Dimension::Overall, vec![60, 70]);
        assert_eq!(history.percentile(Dimension::Overall, 65), 50);
        // no samples for premise -> default
        assert_eq!(history.percentile(Dimension::Premise, 65), 50);
    }
}
