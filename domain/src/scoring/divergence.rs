//! Divergence and consensus detection across reader judgments.
//!
//! Divergence and consensus are independent, non-exclusive outputs: the
//! synthesis narrative consumes both, and the focus group's speaking-order
//! heuristic consumes divergences.

use crate::reader::analysis::AnalysisResult;
use crate::reader::persona::{Dimension, ReaderId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric spread at or above which a dimension counts as divergent.
pub const DIVERGENCE_SPREAD: u8 = 15;

/// A detected, named disagreement between readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Divergence {
    /// A dimension label or "Recommendation"
    pub topic: String,
    /// Each reader's stated position
    pub positions: Vec<(ReaderId, String)>,
    /// One-line synthesis of the disagreement
    pub synthesis: String,
}

/// A point on which the panel agrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusPoint {
    pub topic: String,
    pub statement: String,
    /// Readers voicing this point
    pub readers: Vec<ReaderId>,
}

/// Detect per-dimension and recommendation divergences.
///
/// A dimension diverges iff `max - min >= 15`. Recommendation diverges iff
/// more than one distinct category was given.
pub fn detect_divergences(analyses: &[AnalysisResult]) -> Vec<Divergence> {
    let mut divergences = Vec::new();

    for dimension in Dimension::all() {
        let scored: Vec<(&AnalysisResult, u8)> = analyses
            .iter()
            .filter_map(|a| a.score(dimension).map(|s| (a, s)))
            .collect();
        if scored.len() < 2 {
            continue;
        }

        let (high, high_score) = scored
            .iter()
            .max_by_key(|(_, s)| *s)
            .map(|(a, s)| (&a.reader, *s))
            .unwrap_or((&scored[0].0.reader, 0));
        let (low, low_score) = scored
            .iter()
            .min_by_key(|(_, s)| *s)
            .map(|(a, s)| (&a.reader, *s))
            .unwrap_or((&scored[0].0.reader, 0));

        let spread = high_score - low_score;
        if spread < DIVERGENCE_SPREAD {
            continue;
        }

        let positions = scored
            .iter()
            .map(|(a, score)| {
                let rating = a
                    .rating(dimension)
                    .map(|r| r.to_string())
                    .unwrap_or_default();
                (
                    a.reader.clone(),
                    format!("Rated {} as {} ({}/100)", dimension.label(), rating, score),
                )
            })
            .collect();

        divergences.push(Divergence {
            topic: dimension.label().to_string(),
            positions,
            synthesis: format!(
                "{} scored {} highest and {} lowest, a {}-point spread",
                dimension.label(),
                high,
                low,
                spread
            ),
        });
    }

    let distinct: Vec<_> = {
        let mut recs: Vec<_> = analyses.iter().map(|a| a.recommendation).collect();
        recs.sort();
        recs.dedup();
        recs
    };
    if distinct.len() > 1 {
        let positions: Vec<(ReaderId, String)> = analyses
            .iter()
            .map(|a| {
                (
                    a.reader.clone(),
                    format!("Recommended {}", a.recommendation),
                )
            })
            .collect();
        divergences.push(Divergence {
            topic: "Recommendation".to_string(),
            positions,
            synthesis: format!(
                "The panel split across {} recommendation categories",
                distinct.len()
            ),
        });
    }

    divergences
}

/// Detect consensus points: rating agreement per dimension, and strength or
/// concern statements voiced by at least N-1 of N readers.
pub fn detect_consensus(analyses: &[AnalysisResult]) -> Vec<ConsensusPoint> {
    let mut points = Vec::new();
    if analyses.len() < 2 {
        return points;
    }

    let all_readers: Vec<ReaderId> = analyses.iter().map(|a| a.reader.clone()).collect();

    for dimension in Dimension::all() {
        let ratings: Vec<_> = analyses.iter().filter_map(|a| a.rating(dimension)).collect();
        if ratings.len() != analyses.len() {
            continue;
        }

        let first = ratings[0];
        if ratings.iter().all(|r| *r == first) {
            points.push(ConsensusPoint {
                topic: dimension.label().to_string(),
                statement: format!("All readers rated {} as {}", dimension.label(), first),
                readers: all_readers.clone(),
            });
            continue;
        }

        let min_tier = ratings.iter().map(|r| r.tier()).min().unwrap_or(0);
        let max_tier = ratings.iter().map(|r| r.tier()).max().unwrap_or(0);
        if max_tier - min_tier <= 1 {
            points.push(ConsensusPoint {
                topic: dimension.label().to_string(),
                statement: format!(
                    "Readers aligned on {} within one adjacent tier",
                    dimension.label()
                ),
                readers: all_readers.clone(),
            });
        }
    }

    points.extend(shared_findings(analyses, "Strength", |a| &a.strengths));
    points.extend(shared_findings(analyses, "Concern", |a| &a.concerns));
    points
}

/// Case/whitespace-normalized strength or concern strings voiced by at
/// least N-1 of N readers.
fn shared_findings<'a>(
    analyses: &'a [AnalysisResult],
    topic: &str,
    select: impl Fn(&'a AnalysisResult) -> &'a Vec<String>,
) -> Vec<ConsensusPoint> {
    let threshold = analyses.len().saturating_sub(1).max(2);

    let mut voiced: BTreeMap<String, (String, Vec<ReaderId>)> = BTreeMap::new();
    for analysis in analyses {
        for finding in select(analysis) {
            let key = normalize(finding);
            let entry = voiced
                .entry(key)
                .or_insert_with(|| (finding.clone(), Vec::new()));
            if !entry.1.contains(&analysis.reader) {
                entry.1.push(analysis.reader.clone());
            }
        }
    }

    voiced
        .into_values()
        .filter(|(_, readers)| readers.len() >= threshold)
        .map(|(statement, readers)| ConsensusPoint {
            topic: topic.to_string(),
            statement,
            readers,
        })
        .collect()
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::analysis::{DimensionScore, Recommendation};

    fn analysis(reader: &str, overall: u8, rec: Recommendation) -> AnalysisResult {
        analysis_with(reader, overall, rec, vec!["Strong voice".to_string()], vec![])
    }

    fn analysis_with(
        reader: &str,
        overall: u8,
        rec: Recommendation,
        strengths: Vec<String>,
        concerns: Vec<String>,
    ) -> AnalysisResult {
        let mut scores = BTreeMap::new();
        for dimension in Dimension::all() {
            scores.insert(dimension, DimensionScore::new(overall, None));
        }
        AnalysisResult {
            reader: ReaderId::new(reader),
            scores,
            recommendation: rec,
            strengths,
            concerns,
            standout_quote: None,
            evidence_strength: 100,
        }
    }

    #[test]
    fn test_divergence_iff_spread_at_least_fifteen() {
        // spread 40 -> divergence on every dimension including Overall
        let wide = vec![
            analysis("a", 90, Recommendation::Consider),
            analysis("b", 70, Recommendation::Consider),
            analysis("c", 50, Recommendation::Consider),
        ];
        let divergences = detect_divergences(&wide);
        assert!(divergences.iter().any(|d| d.topic == "Overall"));
        let overall = divergences.iter().find(|d| d.topic == "Overall").unwrap();
        assert!(overall.synthesis.contains("40-point spread"));
        assert_eq!(overall.positions.len(), 3);

        // spread 10 -> none
        let narrow = vec![
            analysis("a", 80, Recommendation::Consider),
            analysis("b", 75, Recommendation::Consider),
            analysis("c", 70, Recommendation::Consider),
        ];
        assert!(detect_divergences(&narrow).is_empty());

        // boundary: exactly 15 diverges
        let boundary = vec![
            analysis("a", 80, Recommendation::Consider),
            analysis("b", 65, Recommendation::Consider),
        ];
        assert!(!detect_divergences(&boundary).is_empty());
    }

    #[test]
    fn test_recommendation_divergence_independent_of_spread() {
        let analyses = vec![
            analysis("a", 75, Recommendation::Recommend),
            analysis("b", 74, Recommendation::Pass),
        ];
        let divergences = detect_divergences(&analyses);
        let rec = divergences
            .iter()
            .find(|d| d.topic == "Recommendation")
            .unwrap();
        assert_eq!(rec.positions.len(), 2);
        assert!(rec.positions[0].1.contains("recommend"));
    }

    #[test]
    fn test_no_recommendation_divergence_when_unanimous() {
        let analyses = vec![
            analysis("a", 75, Recommendation::Consider),
            analysis("b", 74, Recommendation::Consider),
        ];
        assert!(
            detect_divergences(&analyses)
                .iter()
                .all(|d| d.topic != "Recommendation")
        );
    }

    #[test]
    fn test_position_strings_name_ratings() {
        let analyses = vec![
            analysis("a", 92, Recommendation::Consider),
            analysis("b", 55, Recommendation::Consider),
        ];
        let divergences = detect_divergences(&analyses);
        let overall = divergences.iter().find(|d| d.topic == "Overall").unwrap();
        assert_eq!(overall.positions[0].1, "Rated Overall as excellent (92/100)");
    }

    #[test]
    fn test_identical_rating_consensus() {
        let analyses = vec![
            analysis("a", 80, Recommendation::Consider),
            analysis("b", 82, Recommendation::Consider),
        ];
        let points = detect_consensus(&analyses);
        assert!(
            points
                .iter()
                .any(|p| p.topic == "Overall" && p.statement.contains("very_good"))
        );
    }

    #[test]
    fn test_adjacent_tier_consensus() {
        // very_good (80) and good (70) are adjacent tiers
        let analyses = vec![
            analysis("a", 80, Recommendation::Consider),
            analysis("b", 70, Recommendation::Consider),
        ];
        let points = detect_consensus(&analyses);
        assert!(
            points
                .iter()
                .any(|p| p.topic == "Overall" && p.statement.contains("adjacent"))
        );
    }

    #[test]
    fn test_shared_concern_requires_n_minus_one() {
        let analyses = vec![
            analysis_with("a", 70, Recommendation::Consider, vec![], vec![
                "Middle act drags".to_string(),
            ]),
            analysis_with("b", 70, Recommendation::Consider, vec![], vec![
                "  middle ACT   drags ".to_string(),
            ]),
            analysis_with("c", 70, Recommendation::Consider, vec![], vec![
                "Weak ending".to_string(),
            ]),
        ];
        let points = detect_consensus(&analyses);
        let shared: Vec<_> = points.iter().filter(|p| p.topic == "Concern").collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].readers.len(), 2);
    }
}
