//! Lenient parsing of structured model output.
//!
//! Models are instructed to reply with JSON, but real replies wrap it in
//! fenced code blocks or surrounding prose. The extractors here strip fences
//! and scan for the first balanced JSON value before deserializing.

use super::analysis::{AnalysisResult, DimensionScore, Rating, Recommendation};
use super::persona::{Dimension, ReaderId};
use crate::memory::record::{Importance, MemoryItem};
use crate::scoring::synthesis::{ExecutiveEvaluation, Verdict};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced when a model reply cannot be turned into a structured
/// result. These are always analyst-local: the caller excludes the reader
/// from the batch rather than failing it.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("No JSON found in model output")]
    MissingJson,

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing score for dimension: {0}")]
    MissingDimension(Dimension),

    #[error("Invalid recommendation: {0}")]
    InvalidRecommendation(String),

    #[error("Analysis listed no strengths or concerns")]
    EmptyFindings,
}

/// Extract the first balanced JSON value from free text.
///
/// Handles fenced ```json blocks and JSON embedded in prose. Strings and
/// escapes are respected during the balance scan.
pub fn extract_json(text: &str) -> Option<String> {
    let text = match text.find("```") {
        Some(start) => {
            let after = &text[start + 3..];
            let after = after.strip_prefix("json").unwrap_or(after);
            match after.find("```") {
                Some(end) => &after[..end],
                None => after,
            }
        }
        None => text,
    };

    let open = text.find(['{', '['])?;
    let bytes = text[open..].as_bytes();
    let (open_ch, close_ch) = if bytes[0] == b'{' {
        (b'{', b'}')
    } else {
        (b'[', b']')
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            _ if in_string => {}
            _ if b == open_ch => depth += 1,
            _ if b == close_ch => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[open..open + i + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[derive(Deserialize)]
struct RawScore {
    score: u8,
    #[serde(default)]
    rating: Option<String>,
}

#[derive(Deserialize)]
struct RawAnalysis {
    scores: BTreeMap<String, RawScore>,
    recommendation: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    concerns: Vec<String>,
    #[serde(default)]
    standout_quote: Option<String>,
    #[serde(default = "default_evidence")]
    evidence_strength: u8,
}

fn default_evidence() -> u8 {
    50
}

/// Parse one reader's analysis from raw model output.
pub fn parse_analysis(reader: &ReaderId, text: &str) -> Result<AnalysisResult, ParseError> {
    let json = extract_json(text).ok_or(ParseError::MissingJson)?;
    let raw: RawAnalysis = serde_json::from_str(&json)?;

    let mut scores = BTreeMap::new();
    for dimension in Dimension::all() {
        let raw_score = raw
            .scores
            .get(dimension.as_str())
            .ok_or(ParseError::MissingDimension(dimension))?;
        let rating = raw_score
            .rating
            .as_deref()
            .and_then(|r| r.parse::<Rating>().ok());
        scores.insert(dimension, DimensionScore::new(raw_score.score, rating));
    }

    let recommendation: Recommendation = raw
        .recommendation
        .parse()
        .map_err(|_| ParseError::InvalidRecommendation(raw.recommendation.clone()))?;

    let strengths = trim_findings(raw.strengths);
    let concerns = trim_findings(raw.concerns);
    if strengths.is_empty() && concerns.is_empty() {
        return Err(ParseError::EmptyFindings);
    }

    Ok(AnalysisResult {
        reader: reader.clone(),
        scores,
        recommendation,
        strengths,
        concerns,
        standout_quote: raw.standout_quote.filter(|q| !q.trim().is_empty()),
        evidence_strength: raw.evidence_strength.min(100),
    })
}

/// Drop empty entries and cap at the four the report format carries.
fn trim_findings(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(4)
        .collect()
}

#[derive(Deserialize)]
struct RawItem {
    content: String,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    importance: Option<Importance>,
    #[serde(default)]
    page: Option<u32>,
}

/// Maximum atomic items extracted from a single memory event.
pub const MAX_MEMORY_ITEMS: usize = 15;

/// Parse extracted L1 memory items from the extraction model's output.
pub fn parse_memory_items(text: &str) -> Result<Vec<MemoryItem>, ParseError> {
    let json = extract_json(text).ok_or(ParseError::MissingJson)?;
    let raw: Vec<RawItem> = serde_json::from_str(&json)?;
    Ok(raw
        .into_iter()
        .filter(|item| !item.content.trim().is_empty())
        .take(MAX_MEMORY_ITEMS)
        .map(|item| MemoryItem {
            content: item.content.trim().to_string(),
            topic: item.topic.unwrap_or_else(|| "general".to_string()),
            importance: item.importance.unwrap_or_default(),
            page: item.page,
        })
        .collect())
}

#[derive(Deserialize)]
struct RawExecutive {
    verdict: String,
    #[serde(default = "default_evidence")]
    confidence: u8,
    rationale: String,
    #[serde(default)]
    key_factors: Vec<String>,
    #[serde(default)]
    concerns: Vec<String>,
    #[serde(default)]
    citations: Vec<String>,
}

/// Parse the executive decision-maker's verdict.
pub fn parse_executive(text: &str) -> Result<ExecutiveEvaluation, ParseError> {
    let json = extract_json(text).ok_or(ParseError::MissingJson)?;
    let raw: RawExecutive = serde_json::from_str(&json)?;
    let verdict = match raw.verdict.trim().to_lowercase().as_str() {
        "pursue" => Verdict::Pursue,
        "pass" => Verdict::Pass,
        other => return Err(ParseError::InvalidRecommendation(other.to_string())),
    };
    Ok(ExecutiveEvaluation {
        verdict,
        confidence: raw.confidence.min(100),
        rationale: raw.rationale,
        key_factors: raw.key_factors,
        concerns: raw.concerns,
        citations: raw.citations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis_json() -> String {
        r#"Here is my read:
```json
{
  "scores": {
    "premise": {"score": 82, "rating": "very_good"},
    "plot": {"score": 70},
    "character": {"score": 88, "rating": "very_good"},
    "dialogue": {"score": 61},
    "pacing": {"score": 55},
    "overall": {"score": 72}
  },
  "recommendation": "consider",
  "strengths": ["Vivid premise", "Strong protagonist voice"],
  "concerns": ["Middle act drags", "Dialogue tags repetitive"],
  "standout_quote": "The sea kept its own ledger.",
  "evidence_strength": 85
}
```"#
            .to_string()
    }

    #[test]
    fn test_parse_analysis_from_fenced_json() {
        let reader = ReaderId::new("craft");
        let result = parse_analysis(&reader, &sample_analysis_json()).unwrap();
        assert_eq!(result.score(Dimension::Premise), Some(82));
        // rating derived from score when absent
        assert_eq!(result.rating(Dimension::Plot), Some(Rating::Good));
        assert_eq!(result.recommendation, Recommendation::Consider);
        assert_eq!(result.evidence_strength, 85);
        assert_eq!(result.strengths.len(), 2);
    }

    #[test]
    fn test_parse_analysis_missing_dimension_fails() {
        let reader = ReaderId::new("craft");
        let text = r#"{"scores": {"premise": {"score": 82}}, "recommendation": "pass",
                       "strengths": ["x"], "concerns": ["y"]}"#;
        assert!(matches!(
            parse_analysis(&reader, text),
            Err(ParseError::MissingDimension(_))
        ));
    }

    #[test]
    fn test_parse_analysis_unknown_recommendation_fails() {
        let reader = ReaderId::new("craft");
        let text = sample_analysis_json().replace("consider", "maybe");
        assert!(matches!(
            parse_analysis(&reader, &text),
            Err(ParseError::InvalidRecommendation(_))
        ));
    }

    #[test]
    fn test_extract_json_from_prose() {
        let text = "Sure! {\"a\": {\"b\": \"with } brace in string\"}} trailing";
        let json = extract_json(text).unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
    }

    #[test]
    fn test_extract_json_none_when_absent() {
        assert!(extract_json("no structure here").is_none());
    }

    #[test]
    fn test_parse_memory_items_caps_at_fifteen() {
        let items: Vec<String> = (0..20)
            .map(|i| format!(r#"{{"content": "fact {i}", "topic": "plot"}}"#))
            .collect();
        let text = format!("[{}]", items.join(","));
        let parsed = parse_memory_items(&text).unwrap();
        assert_eq!(parsed.len(), MAX_MEMORY_ITEMS);
        assert_eq!(parsed[0].importance, Importance::Medium);
    }

    #[test]
    fn test_parse_executive() {
        let text = r#"{"verdict": "Pursue", "confidence": 78, "rationale": "Strong consensus",
                       "key_factors": ["premise"], "concerns": [], "citations": ["overall 72"]}"#;
        let eval = parse_executive(text).unwrap();
        assert_eq!(eval.verdict, Verdict::Pursue);
        assert_eq!(eval.confidence, 78);
    }
}
