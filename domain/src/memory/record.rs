//! Reader memory records - three-tier per-reader memory keyed by
//! (reader, project, draft).
//!
//! - L1: atomic extracted facts ([`MemoryItem`]), append-only within a draft
//! - L2: the latest structured judgment snapshot ([`JudgmentSnapshot`])
//! - L3: narrative summary + evolution notes, replaced on each write
//!
//! A record also carries score deltas versus the immediately preceding
//! draft's memory, and a back-reference to that draft by number only. The
//! reference is weak: it is used for evolution lookups, never for cascading
//! deletion.

use crate::reader::analysis::{AnalysisResult, DimensionScore, Rating, Recommendation};
use crate::reader::persona::{Dimension, ReaderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Partition key for memory records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryKey {
    pub reader: ReaderId,
    pub project: String,
    pub draft: u32,
}

impl MemoryKey {
    pub fn new(reader: impl Into<ReaderId>, project: impl Into<String>, draft: u32) -> Self {
        Self {
            reader: reader.into(),
            project: project.into(),
            draft,
        }
    }

    /// The same reader and project, one draft earlier. `None` for draft 1.
    pub fn prior_draft(&self) -> Option<MemoryKey> {
        (self.draft > 1).then(|| MemoryKey {
            reader: self.reader.clone(),
            project: self.project.clone(),
            draft: self.draft - 1,
        })
    }
}

impl std::fmt::Display for MemoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/d{}", self.project, self.reader, self.draft)
    }
}

/// Importance classification for an extracted fact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    #[default]
    Medium,
    Low,
}

/// L1: one atomic extracted fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub content: String,
    pub topic: String,
    pub importance: Importance,
    pub page: Option<u32>,
}

/// L2: the latest structured judgment snapshot for a draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentSnapshot {
    pub scores: BTreeMap<Dimension, DimensionScore>,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: Recommendation,
}

impl From<&AnalysisResult> for JudgmentSnapshot {
    fn from(analysis: &AnalysisResult) -> Self {
        Self {
            scores: analysis.scores.clone(),
            strengths: analysis.strengths.clone(),
            concerns: analysis.concerns.clone(),
            recommendation: analysis.recommendation,
        }
    }
}

/// Per-dimension change versus the prior draft's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub dimension: Dimension,
    pub previous_score: u8,
    pub current_score: u8,
    pub previous_rating: Rating,
    pub current_rating: Rating,
}

impl ScoreDelta {
    /// Signed numeric movement from the prior draft.
    pub fn movement(&self) -> i16 {
        self.current_score as i16 - self.previous_score as i16
    }
}

/// Compute per-dimension deltas, retaining only dimensions whose numeric
/// score changed.
pub fn score_deltas(
    previous: &BTreeMap<Dimension, DimensionScore>,
    current: &BTreeMap<Dimension, DimensionScore>,
) -> Vec<ScoreDelta> {
    current
        .iter()
        .filter_map(|(dimension, score)| {
            let prev = previous.get(dimension)?;
            (prev.score != score.score).then(|| ScoreDelta {
                dimension: *dimension,
                previous_score: prev.score,
                current_score: score.score,
                previous_rating: prev.rating,
                current_rating: score.rating,
            })
        })
        .collect()
}

/// The kind of event being merged into a reader's memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryEventKind {
    Coverage,
    FocusGroup,
    Chat,
}

impl MemoryEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryEventKind::Coverage => "coverage",
            MemoryEventKind::FocusGroup => "focus_group",
            MemoryEventKind::Chat => "chat",
        }
    }
}

/// One event to memorize: free-text content, optionally carrying the
/// structured judgment that accompanies a coverage event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub kind: MemoryEventKind,
    pub content: String,
    pub snapshot: Option<JudgmentSnapshot>,
}

impl MemoryEvent {
    pub fn coverage(analysis: &AnalysisResult) -> Self {
        Self {
            kind: MemoryEventKind::Coverage,
            content: analysis.summary_line(),
            snapshot: Some(JudgmentSnapshot::from(analysis)),
        }
    }

    pub fn focus_group(content: impl Into<String>) -> Self {
        Self {
            kind: MemoryEventKind::FocusGroup,
            content: content.into(),
            snapshot: None,
        }
    }

    pub fn chat(content: impl Into<String>) -> Self {
        Self {
            kind: MemoryEventKind::Chat,
            content: content.into(),
            snapshot: None,
        }
    }
}

/// A reader's full memory record for one draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderMemory {
    pub key: MemoryKey,
    /// L1 extracted facts, append-only
    pub items: Vec<MemoryItem>,
    /// L2 latest judgment snapshot
    pub snapshot: Option<JudgmentSnapshot>,
    /// L3 narrative summary, replaced on each write
    pub narrative: String,
    /// L3 evolution notes, replaced on each write
    pub evolution_notes: String,
    /// Changed dimensions versus the prior draft's snapshot
    pub score_deltas: Vec<ScoreDelta>,
    /// Weak back-reference to the preceding draft's memory, by draft number
    pub prior_draft: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl ReaderMemory {
    pub fn new(key: MemoryKey) -> Self {
        Self {
            key,
            items: Vec::new(),
            snapshot: None,
            narrative: String::new(),
            evolution_notes: String::new(),
            score_deltas: Vec::new(),
            prior_draft: None,
            updated_at: Utc::now(),
        }
    }
}

/// Outcome of a memory read for a (reader, project, draft).
///
/// A record found one draft back is flagged as prior, never silently
/// presented as current; callers must render the distinction.
#[derive(Debug, Clone)]
pub enum RecallOutcome {
    /// Memory exists for the exact draft
    Current(ReaderMemory),
    /// No memory for this draft; this is the immediately preceding draft's
    Prior(ReaderMemory),
    /// Nothing for this draft or the one before it
    NotFound,
}

impl RecallOutcome {
    pub fn memory(&self) -> Option<&ReaderMemory> {
        match self {
            RecallOutcome::Current(m) | RecallOutcome::Prior(m) => Some(m),
            RecallOutcome::NotFound => None,
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, RecallOutcome::Current(_))
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, RecallOutcome::NotFound)
    }
}
