//! Analysis result value objects - one reader's immutable judgment of a
//! manuscript.
//!
//! - [`Rating`] - 5-point categorical scale with fixed numeric thresholds
//! - [`Recommendation`] - 4-point ordinal recommendation category
//! - [`DimensionScore`] - categorical rating + 0-100 numeric score
//! - [`AnalysisResult`] - the complete judgment, produced once per
//!   (reader, manuscript) pair

use super::persona::{Dimension, ReaderId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Categorical rating on the 5-point ordinal scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Excellent,
    VeryGood,
    Good,
    SoSo,
    NotGood,
}

impl Rating {
    /// Map a 0-100 numeric score to its categorical rating.
    ///
    /// Thresholds are fixed: >=90 excellent, >=75 very_good, >=60 good,
    /// >=45 so_so, else not_good.
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Rating::Excellent,
            75..=89 => Rating::VeryGood,
            60..=74 => Rating::Good,
            45..=59 => Rating::SoSo,
            _ => Rating::NotGood,
        }
    }

    /// Ordinal tier, 0 = excellent through 4 = not_good.
    ///
    /// Adjacent tiers differ by exactly 1; used for consensus adjacency.
    pub fn tier(&self) -> u8 {
        match self {
            Rating::Excellent => 0,
            Rating::VeryGood => 1,
            Rating::Good => 2,
            Rating::SoSo => 3,
            Rating::NotGood => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::VeryGood => "very_good",
            Rating::Good => "good",
            Rating::SoSo => "so_so",
            Rating::NotGood => "not_good",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "excellent" => Ok(Rating::Excellent),
            "very_good" | "very good" => Ok(Rating::VeryGood),
            "good" => Ok(Rating::Good),
            "so_so" | "so so" | "so-so" => Ok(Rating::SoSo),
            "not_good" | "not good" => Ok(Rating::NotGood),
            other => Err(format!("unknown rating: {other}")),
        }
    }
}

/// Recommendation category on the 4-point ordinal scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Recommend,
    Consider,
    LowConsider,
    Pass,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Recommend => "recommend",
            Recommendation::Consider => "consider",
            Recommendation::LowConsider => "low_consider",
            Recommendation::Pass => "pass",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recommend" => Ok(Recommendation::Recommend),
            "consider" => Ok(Recommendation::Consider),
            "low_consider" | "low consider" => Ok(Recommendation::LowConsider),
            "pass" => Ok(Recommendation::Pass),
            other => Err(format!("unknown recommendation: {other}")),
        }
    }
}

/// One dimension's judgment: categorical rating plus parallel numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub rating: Rating,
    pub score: u8,
}

impl DimensionScore {
    /// Build a score, clamping to 100 and deriving the rating when absent.
    pub fn new(score: u8, rating: Option<Rating>) -> Self {
        let score = score.min(100);
        Self {
            score,
            rating: rating.unwrap_or_else(|| Rating::from_score(score)),
        }
    }
}

/// One reader's complete judgment of one manuscript.
///
/// Immutable once produced; feeds both harmonization and memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The reader that produced this judgment
    pub reader: ReaderId,
    /// Per-dimension scores, covering all six dimensions
    pub scores: BTreeMap<Dimension, DimensionScore>,
    /// Recommendation category
    pub recommendation: Recommendation,
    /// 2-4 key strengths
    pub strengths: Vec<String>,
    /// 2-4 key concerns
    pub concerns: Vec<String>,
    /// One standout quotation from the manuscript
    pub standout_quote: Option<String>,
    /// Evidence-strength scalar (0-100), used as harmonization weight
    pub evidence_strength: u8,
}

impl AnalysisResult {
    pub fn score(&self, dimension: Dimension) -> Option<u8> {
        self.scores.get(&dimension).map(|s| s.score)
    }

    pub fn rating(&self, dimension: Dimension) -> Option<Rating> {
        self.scores.get(&dimension).map(|s| s.rating)
    }

    /// Condensed one-paragraph summary for prompt injection.
    pub fn summary_line(&self) -> String {
        let overall = self
            .scores
            .get(&Dimension::Overall)
            .map(|s| format!("{} ({}/100)", s.rating, s.score))
            .unwrap_or_else(|| "unscored".to_string());
        format!(
            "overall {}, recommendation {}; strengths: {}; concerns: {}",
            overall,
            self.recommendation,
            self.strengths.join("; "),
            self.concerns.join("; "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_threshold_boundaries() {
        // Exact boundaries per the calibration rules
        assert_eq!(Rating::from_score(90), Rating::Excellent);
        assert_eq!(Rating::from_score(89), Rating::VeryGood);
        assert_eq!(Rating::from_score(75), Rating::VeryGood);
        assert_eq!(Rating::from_score(74), Rating::Good);
        assert_eq!(Rating::from_score(60), Rating::Good);
        assert_eq!(Rating::from_score(59), Rating::SoSo);
        assert_eq!(Rating::from_score(45), Rating::SoSo);
        assert_eq!(Rating::from_score(44), Rating::NotGood);
        assert_eq!(Rating::from_score(100), Rating::Excellent);
        assert_eq!(Rating::from_score(0), Rating::NotGood);
    }

    #[test]
    fn test_rating_tiers_are_adjacent() {
        assert_eq!(Rating::Excellent.tier(), 0);
        assert_eq!(Rating::NotGood.tier(), 4);
        assert_eq!(Rating::VeryGood.tier().abs_diff(Rating::Good.tier()), 1);
    }

    #[test]
    fn test_recommendation_parsing() {
        assert_eq!(
            "Low Consider".parse::<Recommendation>().unwrap(),
            Recommendation::LowConsider
        );
        assert!("maybe".parse::<Recommendation>().is_err());
    }

    #[test]
    fn test_dimension_score_clamps_and_derives() {
        let s = DimensionScore::new(120, None);
        assert_eq!(s.score, 100);
        assert_eq!(s.rating, Rating::Excellent);

        let s = DimensionScore::new(50, Some(Rating::Good));
        assert_eq!(s.rating, Rating::Good);
    }
}
