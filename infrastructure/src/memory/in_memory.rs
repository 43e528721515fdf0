//! In-process memory store.
//!
//! Holds reader memory records in a `RwLock`-guarded map, keyed by
//! (reader, project, draft). Suitable for single-process sessions; a
//! persistent backend can replace it behind the same port. Writes are
//! sequenced by the callers (the memorize use case), so the store itself
//! only guards map access.

use async_trait::async_trait;
use panel_application::{MemoryStore, StoreError};
use panel_domain::{MemoryItem, MemoryKey, ReaderMemory};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Memory store backed by a process-local map.
#[derive(Default)]
pub struct InMemoryMemoryStore {
    records: RwLock<HashMap<MemoryKey, ReaderMemory>>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    /// Replace the record for its key, preserving the items already
    /// accumulated under that key. L1 items only ever grow within a draft;
    /// `upsert` replaces the snapshot and narrative tiers.
    async fn upsert(&self, mut memory: ReaderMemory) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.remove(&memory.key) {
            let mut items = existing.items;
            items.extend(memory.items);
            memory.items = items;
        }
        debug!(key = %memory.key, items = memory.items.len(), "Memory record upserted");
        records.insert(memory.key.clone(), memory);
        Ok(())
    }

    async fn append_items(
        &self,
        key: &MemoryKey,
        items: Vec<MemoryItem>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records
            .entry(key.clone())
            .or_insert_with(|| ReaderMemory::new(key.clone()))
            .items
            .extend(items);
        Ok(())
    }

    async fn fetch(&self, key: &MemoryKey) -> Result<Option<ReaderMemory>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }
}
