//! Speaking-order heuristic.
//!
//! Computed once per session: if a divergence exists, the readers named in
//! its first entry speak first, so the most-divergent voices open the
//! discussion. Remaining readers follow in their configured order.

use crate::reader::persona::{ReaderId, ReaderPersona};
use crate::scoring::divergence::Divergence;

/// Compute the speaking order for a session.
pub fn speaking_order(panel: &[ReaderPersona], divergences: &[Divergence]) -> Vec<ReaderId> {
    let mut order: Vec<ReaderId> = Vec::with_capacity(panel.len());

    if let Some(first) = divergences.first() {
        for (reader, _) in &first.positions {
            if panel.iter().any(|p| &p.id == reader) && !order.contains(reader) {
                order.push(reader.clone());
            }
        }
    }

    for persona in panel {
        if !order.contains(&persona.id) {
            order.push(persona.id.clone());
        }
    }

    order
}
