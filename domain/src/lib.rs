//! Domain layer for reader-panel
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Panel
//!
//! A panel of simulated readers independently judges a manuscript. Their
//! structured judgments are harmonized into one calibrated consensus report.
//!
//! ## Memory
//!
//! Each reader carries a three-tier memory across manuscript drafts:
//! atomic extracted facts (L1), the latest structured judgment snapshot (L2),
//! and an evolving narrative summary (L3).
//!
//! ## Focus Group
//!
//! A moderator-led, turn-ordered discussion between readers, with
//! reader-to-reader reaction sub-turns.

pub mod core;
pub mod focus_group;
pub mod memory;
pub mod prompt;
pub mod reader;
pub mod scoring;
pub mod stream;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    manuscript::{Manuscript, ManuscriptMeta},
    phase::Phase,
};
pub use focus_group::{
    order::speaking_order,
    reaction::{ParsedReaction, parse_reaction},
    session::{
        FocusGroupSession, FocusMessage, Reaction, ReactionKind, SessionId, SessionState, Speaker,
    },
};
pub use memory::{
    context::render_memory_context,
    record::{
        Importance, JudgmentSnapshot, MemoryEvent, MemoryEventKind, MemoryItem, MemoryKey,
        ReaderMemory, RecallOutcome, ScoreDelta, score_deltas,
    },
};
pub use prompt::PromptTemplate;
pub use reader::{
    analysis::{AnalysisResult, DimensionScore, Rating, Recommendation},
    parsing::{ParseError, parse_analysis, parse_executive, parse_memory_items},
    persona::{Dimension, DimensionWeights, ReaderId, ReaderPersona},
};
pub use scoring::{
    calibration::{ScoreHistory, percentile},
    divergence::{ConsensusPoint, Divergence, detect_consensus, detect_divergences},
    harmonize::{HarmonizedScore, HarmonizedScores, ScoringError, harmonize},
    synthesis::{ConfidenceLevel, ExecutiveEvaluation, Verdict, build_narrative},
};
pub use stream::StreamEvent;
