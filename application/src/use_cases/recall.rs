//! Memory read engine.
//!
//! Returns the memory record for the exact draft when present. When absent
//! it walks to the immediately preceding draft within the same project and
//! returns that record flagged as prior rather than current. Draft 1 has no
//! further fallback. Callers can scope the extracted items to one topic and
//! opt out of the prior-draft walk entirely.

use crate::ports::memory_store::{MemoryStore, StoreError};
use panel_domain::{MemoryKey, ReaderId, ReaderMemory, ReaderPersona, RecallOutcome};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Use case for reading reader memory with prior-draft fallback
pub struct RecallUseCase {
    store: Arc<dyn MemoryStore>,
}

impl RecallUseCase {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Recall one reader's full memory for a (project, draft).
    pub async fn execute(&self, key: &MemoryKey) -> Result<RecallOutcome, StoreError> {
        self.execute_scoped(key, None, true).await
    }

    /// Recall with optional topic scoping and control over the prior-draft
    /// walk. A topic keeps only extracted items on that topic (snapshot and
    /// narrative are unaffected); `include_prior = false` treats a missing
    /// draft as not found instead of walking back one draft.
    pub async fn execute_scoped(
        &self,
        key: &MemoryKey,
        topic: Option<&str>,
        include_prior: bool,
    ) -> Result<RecallOutcome, StoreError> {
        if let Some(memory) = self.store.fetch(key).await? {
            return Ok(RecallOutcome::Current(scope_to_topic(memory, topic)));
        }

        let prior_key = match key.prior_draft() {
            Some(prior_key) if include_prior => prior_key,
            _ => return Ok(RecallOutcome::NotFound),
        };

        match self.store.fetch(&prior_key).await? {
            Some(memory) => {
                debug!(%key, "No memory for draft; falling back to prior draft");
                Ok(RecallOutcome::Prior(scope_to_topic(memory, topic)))
            }
            None => Ok(RecallOutcome::NotFound),
        }
    }

    /// Recall every panelist's memory at once, with the same fallback
    /// semantics per reader. Used to seed the fan-out coordinator and the
    /// focus-group engine with continuity context.
    pub async fn recall_all(
        &self,
        panel: &[ReaderPersona],
        project: &str,
        draft: u32,
    ) -> Result<HashMap<ReaderId, RecallOutcome>, StoreError> {
        let mut outcomes = HashMap::with_capacity(panel.len());
        for persona in panel {
            let key = MemoryKey::new(persona.id.clone(), project, draft);
            outcomes.insert(persona.id.clone(), self.execute(&key).await?);
        }
        Ok(outcomes)
    }
}

fn scope_to_topic(mut memory: ReaderMemory, topic: Option<&str>) -> ReaderMemory {
    if let Some(topic) = topic {
        memory
            .items
            .retain(|item| item.topic.eq_ignore_ascii_case(topic));
    }
    memory
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use panel_domain::{Importance, MemoryItem, ReaderMemory};
    use tokio::sync::RwLock;

    /// Minimal in-memory store for exercising fallback walks.
    struct MapStore {
        records: RwLock<HashMap<MemoryKey, ReaderMemory>>,
    }

    impl MapStore {
        fn new() -> Self {
            Self {
                records: RwLock::new(HashMap::new()),
            }
        }

        async fn seed(&self, key: MemoryKey) {
            let memory = ReaderMemory::new(key.clone());
            self.records.write().await.insert(key, memory);
        }

        async fn seed_with_items(&self, key: MemoryKey, items: Vec<MemoryItem>) {
            let mut memory = ReaderMemory::new(key.clone());
            memory.items = items;
            self.records.write().await.insert(key, memory);
        }
    }

    fn item(topic: &str, content: &str) -> MemoryItem {
        MemoryItem {
            content: content.to_string(),
            topic: topic.to_string(),
            importance: Importance::Medium,
            page: None,
        }
    }

    #[async_trait]
    impl MemoryStore for MapStore {
        async fn upsert(&self, memory: ReaderMemory) -> Result<(), StoreError> {
            self.records.write().await.insert(memory.key.clone(), memory);
            Ok(())
        }

        async fn append_items(
            &self,
            key: &MemoryKey,
            items: Vec<MemoryItem>,
        ) -> Result<(), StoreError> {
            if let Some(memory) = self.records.write().await.get_mut(key) {
                memory.items.extend(items);
            }
            Ok(())
        }

        async fn fetch(&self, key: &MemoryKey) -> Result<Option<ReaderMemory>, StoreError> {
            Ok(self.records.read().await.get(key).cloned())
        }
    }

    #[tokio::test]
    async fn exact_draft_is_current() {
        let store = Arc::new(MapStore::new());
        store.seed(MemoryKey::new("craft", "proj", 2)).await;
        let recall = RecallUseCase::new(store);
        let outcome = recall
            .execute(&MemoryKey::new("craft", "proj", 2))
            .await
            .unwrap();
        assert!(outcome.is_current());
    }

    #[tokio::test]
    async fn missing_draft_falls_back_one_step() {
        let store = Arc::new(MapStore::new());
        store.seed(MemoryKey::new("craft", "proj", 2)).await;
        let recall = RecallUseCase::new(store);
        let outcome = recall
            .execute(&MemoryKey::new("craft", "proj", 3))
            .await
            .unwrap();
        assert!(outcome.is_found());
        assert!(!outcome.is_current());
        assert_eq!(outcome.memory().unwrap().key.draft, 2);
    }

    #[tokio::test]
    async fn fallback_does_not_walk_two_steps() {
        let store = Arc::new(MapStore::new());
        store.seed(MemoryKey::new("craft", "proj", 1)).await;
        let recall = RecallUseCase::new(store);
        let outcome = recall
            .execute(&MemoryKey::new("craft", "proj", 3))
            .await
            .unwrap();
        assert!(!outcome.is_found());
    }

    #[tokio::test]
    async fn draft_one_has_no_fallback() {
        let store = Arc::new(MapStore::new());
        let recall = RecallUseCase::new(store);
        let outcome = recall
            .execute(&MemoryKey::new("craft", "proj", 1))
            .await
            .unwrap();
        assert!(!outcome.is_found());
    }

    #[tokio::test]
    async fn topic_scoping_filters_extracted_items() {
        let store = Arc::new(MapStore::new());
        store
            .seed_with_items(
                MemoryKey::new("craft", "proj", 1),
                vec![
                    item("pacing", "Middle act drags."),
                    item("dialogue", "Banter lands."),
                ],
            )
            .await;
        let recall = RecallUseCase::new(store);
        let outcome = recall
            .execute_scoped(&MemoryKey::new("craft", "proj", 1), Some("Pacing"), true)
            .await
            .unwrap();
        let memory = outcome.memory().unwrap();
        assert_eq!(memory.items.len(), 1);
        assert_eq!(memory.items[0].content, "Middle act drags.");
    }

    #[tokio::test]
    async fn topic_scoping_applies_to_the_prior_draft_too() {
        let store = Arc::new(MapStore::new());
        store
            .seed_with_items(
                MemoryKey::new("craft", "proj", 1),
                vec![
                    item("pacing", "Middle act drags."),
                    item("dialogue", "Banter lands."),
                ],
            )
            .await;
        let recall = RecallUseCase::new(store);
        let outcome = recall
            .execute_scoped(&MemoryKey::new("craft", "proj", 2), Some("dialogue"), true)
            .await
            .unwrap();
        assert!(!outcome.is_current());
        assert_eq!(outcome.memory().unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn prior_walk_can_be_disabled() {
        let store = Arc::new(MapStore::new());
        store.seed(MemoryKey::new("craft", "proj", 2)).await;
        let recall = RecallUseCase::new(store);
        let outcome = recall
            .execute_scoped(&MemoryKey::new("craft", "proj", 3), None, false)
            .await
            .unwrap();
        assert!(!outcome.is_found());
    }

    #[tokio::test]
    async fn recall_all_covers_every_reader() {
        let store = Arc::new(MapStore::new());
        store.seed(MemoryKey::new("craft", "proj", 1)).await;
        let recall = RecallUseCase::new(store);
        let panel = vec![
            ReaderPersona::new("craft", "Craft"),
            ReaderPersona::new("market", "Market"),
        ];
        let outcomes = recall.recall_all(&panel, "proj", 1).await.unwrap();
        assert!(outcomes[&ReaderId::new("craft")].is_found());
        assert!(!outcomes[&ReaderId::new("market")].is_found());
    }
}
