//! Rendering memory records into prompt-insertable context strings.
//!
//! This is the only way memory re-enters the reasoning loop: a single
//! string composed of the narrative summary, evolution notes, and condensed
//! score/strength/concern lines, injected into subsequent inference calls.

use super::record::{ReaderMemory, RecallOutcome};
use crate::reader::persona::Dimension;

/// Render a recall outcome into a prompt context string.
///
/// Returns `None` when nothing was recalled. Prior-draft records are
/// explicitly marked as carried forward so the model never mistakes them
/// for current-draft knowledge.
pub fn render_memory_context(outcome: &RecallOutcome) -> Option<String> {
    match outcome {
        RecallOutcome::Current(memory) => Some(render(memory, true)),
        RecallOutcome::Prior(memory) => Some(render(memory, false)),
        RecallOutcome::NotFound => None,
    }
}

fn render(memory: &ReaderMemory, current: bool) -> String {
    let mut context = String::new();

    if current {
        context.push_str(&format!(
            "Your memory of this manuscript (draft {}):\n",
            memory.key.draft
        ));
    } else {
        context.push_str(&format!(
            "Your memory is from the previous draft ({}); the manuscript has since been revised:\n",
            memory.key.draft
        ));
    }

    if !memory.narrative.is_empty() {
        context.push_str(&memory.narrative);
        context.push('\n');
    }
    if !memory.evolution_notes.is_empty() {
        context.push_str("How your view has evolved: ");
        context.push_str(&memory.evolution_notes);
        context.push('\n');
    }

    if let Some(snapshot) = &memory.snapshot {
        let scores: Vec<String> = Dimension::all()
            .iter()
            .filter_map(|d| {
                snapshot
                    .scores
                    .get(d)
                    .map(|s| format!("{} {}/100", d.as_str(), s.score))
            })
            .collect();
        if !scores.is_empty() {
            context.push_str(&format!("Your last scores: {}.\n", scores.join(", ")));
        }
        if !snapshot.strengths.is_empty() {
            context.push_str(&format!(
                "Strengths you noted: {}.\n",
                snapshot.strengths.join("; ")
            ));
        }
        if !snapshot.concerns.is_empty() {
            context.push_str(&format!(
                "Concerns you raised: {}.\n",
                snapshot.concerns.join("; ")
            ));
        }
        context.push_str(&format!(
            "Your recommendation was: {}.\n",
            snapshot.recommendation
        ));
    }

    if !memory.score_deltas.is_empty() {
        let deltas: Vec<String> = memory
            .score_deltas
            .iter()
            .map(|d| {
                format!(
                    "{} {} -> {} ({:+})",
                    d.dimension.as_str(),
                    d.previous_score,
                    d.current_score,
                    d.movement()
                )
            })
            .collect();
        context.push_str(&format!("Score movement since the prior draft: {}.\n", deltas.join(", ")));
    }

    context.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::record::{JudgmentSnapshot, MemoryKey};
    use crate::reader::analysis::{DimensionScore, Recommendation};
    use std::collections::BTreeMap;

    fn memory_with_snapshot() -> ReaderMemory {
        let mut memory = ReaderMemory::new(MemoryKey::new("craft", "proj", 2));
        memory.narrative = "A maritime revenge tale with a strong opening.".to_string();
        memory.evolution_notes = "The pacing concerns from draft 1 persist.".to_string();
        let mut scores = BTreeMap::new();
        scores.insert(Dimension::Overall, DimensionScore::new(72, None));
        memory.snapshot = Some(JudgmentSnapshot {
            scores,
            strengths: vec!["Vivid setting".to_string()],
            concerns: vec!["Slow middle".to_string()],
            recommendation: Recommendation::Consider,
        });
        memory
    }

    #[test]
    fn test_current_render_includes_tiers() {
        let outcome = RecallOutcome::Current(memory_with_snapshot());
        let context = render_memory_context(&outcome).unwrap();
        assert!(context.contains("draft 2"));
        assert!(context.contains("maritime revenge"));
        assert!(context.contains("overall 72/100"));
        assert!(context.contains("Slow middle"));
        assert!(context.contains("consider"));
    }

    #[test]
    fn test_prior_render_is_marked() {
        let outcome = RecallOutcome::Prior(memory_with_snapshot());
        let context = render_memory_context(&outcome).unwrap();
        assert!(context.contains("previous draft"));
        assert!(context.contains("since been revised"));
    }

    #[test]
    fn test_not_found_renders_nothing() {
        assert!(render_memory_context(&RecallOutcome::NotFound).is_none());
    }
}
