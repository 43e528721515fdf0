//! Memory write engine.
//!
//! Merges one event (coverage, focus-group statement, or chat exchange)
//! into a reader's memory: extracts bounded L1 items through a secondary
//! extraction call, re-synthesizes the L3 narrative, computes score deltas
//! against the prior draft, and upserts the record.
//!
//! Every failure mode here is non-fatal: extraction failures yield zero
//! items, narrative-call failures fall back to the raw event content, and
//! persistence failures are logged and swallowed. The write is a side
//! effect of an already-delivered result and must never roll it back.

use crate::ports::event_relay::{EventRelay, PanelEvent};
use crate::ports::gateway::{ChatMessage, InferenceGateway};
use crate::ports::memory_store::MemoryStore;
use panel_domain::reader::parsing::extract_json;
use panel_domain::{
    MemoryEvent, MemoryEventKind, MemoryItem, MemoryKey, PromptTemplate, ReaderMemory,
    parse_memory_items, score_deltas,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct RawNarrative {
    summary: String,
    #[serde(default)]
    evolution: String,
}

/// Use case for merging an event into a reader's cross-draft memory
pub struct MemorizeUseCase<G: InferenceGateway + 'static> {
    gateway: Arc<G>,
    store: Arc<dyn MemoryStore>,
}

impl<G: InferenceGateway + 'static> MemorizeUseCase<G> {
    /// `gateway` should point at the smaller-footprint extraction model;
    /// this use case never needs full judgment quality.
    pub fn new(gateway: Arc<G>, store: Arc<dyn MemoryStore>) -> Self {
        Self { gateway, store }
    }

    /// Merge `event` into the memory record for `key`.
    ///
    /// `prior` is the preceding draft's memory for the same reader, used
    /// for score deltas and narrative continuity. Returns the written
    /// record, carrying the items extracted by this write.
    pub async fn execute(
        &self,
        key: MemoryKey,
        event: MemoryEvent,
        prior: Option<ReaderMemory>,
        relay: &EventRelay,
    ) -> ReaderMemory {
        let existing = match self.store.fetch(&key).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(%key, "Memory fetch failed; treating as first write: {e}");
                None
            }
        };

        let items = self.extract_items(&key, &event, relay).await;
        let (narrative, evolution_notes) = self
            .synthesize_narrative(&event, existing.as_ref(), prior.as_ref())
            .await;

        let mut memory = ReaderMemory::new(key.clone());
        memory.narrative = narrative;
        memory.evolution_notes = evolution_notes;
        memory.snapshot = event
            .snapshot
            .clone()
            .or_else(|| existing.as_ref().and_then(|m| m.snapshot.clone()));
        memory.prior_draft = prior.as_ref().map(|p| p.key.draft);

        // Deltas only for coverage events carrying scores, against a prior
        // draft that also carried scores.
        memory.score_deltas = match (&event.kind, &event.snapshot, &prior) {
            (MemoryEventKind::Coverage, Some(snapshot), Some(prior_memory)) => prior_memory
                .snapshot
                .as_ref()
                .map(|prev| score_deltas(&prev.scores, &snapshot.scores))
                .unwrap_or_default(),
            _ => existing.map(|m| m.score_deltas).unwrap_or_default(),
        };

        if let Err(e) = self.store.upsert(memory.clone()).await {
            warn!(%key, "Memory upsert failed (best-effort, continuing): {e}");
        }
        if !items.is_empty() {
            if let Err(e) = self.store.append_items(&key, items.clone()).await {
                warn!(%key, "Memory item append failed (best-effort, continuing): {e}");
            }
        }

        memory.items = items;
        memory
    }

    /// Extract bounded L1 items through the secondary extraction call.
    ///
    /// Any failure degrades to zero items; the narrative still proceeds
    /// from the raw event content.
    async fn extract_items(
        &self,
        key: &MemoryKey,
        event: &MemoryEvent,
        relay: &EventRelay,
    ) -> Vec<MemoryItem> {
        relay
            .emit(PanelEvent::ToolStart {
                name: "memory_extraction".to_string(),
                reader: Some(key.reader.clone()),
            })
            .await;

        let prompt = PromptTemplate::extraction_prompt(event.kind, &event.content);
        let items = match self
            .gateway
            .generate(PromptTemplate::extraction_system(), &[ChatMessage::user(prompt)])
            .await
        {
            Ok(text) => match parse_memory_items(&text) {
                Ok(items) => items,
                Err(e) => {
                    warn!(%key, "Memory extraction unparsable; keeping zero items: {e}");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(%key, "Memory extraction call failed; keeping zero items: {e}");
                Vec::new()
            }
        };

        relay
            .emit(PanelEvent::ToolEnd {
                name: "memory_extraction".to_string(),
                reader: Some(key.reader.clone()),
            })
            .await;
        items
    }

    /// Re-synthesize the L3 narrative: previous narrative plus the new
    /// event, replaced wholesale.
    async fn synthesize_narrative(
        &self,
        event: &MemoryEvent,
        existing: Option<&ReaderMemory>,
        prior: Option<&ReaderMemory>,
    ) -> (String, String) {
        // Same-draft narrative wins; a new draft seeds from the prior one.
        let previous = existing
            .filter(|m| !m.narrative.is_empty())
            .or(prior)
            .map(|m| m.narrative.as_str());

        let prompt = PromptTemplate::narrative_prompt(previous, event);
        match self
            .gateway
            .generate(PromptTemplate::narrative_system(), &[ChatMessage::user(prompt)])
            .await
        {
            Ok(text) => match extract_json(&text)
                .and_then(|json| serde_json::from_str::<RawNarrative>(&json).ok())
            {
                Some(raw) => (raw.summary, raw.evolution),
                None => {
                    debug!("Narrative reply unparsable; using raw text as summary");
                    (text.trim().to_string(), carry_evolution(existing, prior))
                }
            },
            Err(e) => {
                warn!("Narrative call failed; falling back to event content: {e}");
                (event.content.clone(), carry_evolution(existing, prior))
            }
        }
    }
}

fn carry_evolution(existing: Option<&ReaderMemory>, prior: Option<&ReaderMemory>) -> String {
    existing
        .or(prior)
        .map(|m| m.evolution_notes.clone())
        .unwrap_or_default()
}
