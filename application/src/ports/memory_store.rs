//! Memory persistence port.
//!
//! The design depends only on two operation shapes from the storage
//! collaborator: upsert-by-(reader, draft) and append-items. Reads are
//! exact-key lookups; the prior-draft fallback lives in the recall use
//! case, not in the store.

use async_trait::async_trait;
use panel_domain::{MemoryItem, MemoryKey, ReaderMemory};
use thiserror::Error;

/// Errors from the storage collaborator
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// Storage collaborator for reader memory records.
///
/// Records are logically partitioned per (reader, project, draft) and are
/// never concurrently written by two callers; writes are sequenced by the
/// caller rather than locked here.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert or replace the memory record for its key.
    ///
    /// Re-invoking for the same key upserts the same record; it must not
    /// duplicate. Accumulated L1 items are preserved across upserts.
    async fn upsert(&self, memory: ReaderMemory) -> Result<(), StoreError>;

    /// Append extracted L1 items to the record for `key`.
    async fn append_items(&self, key: &MemoryKey, items: Vec<MemoryItem>)
    -> Result<(), StoreError>;

    /// Fetch the record for exactly `key`, if present.
    async fn fetch(&self, key: &MemoryKey) -> Result<Option<ReaderMemory>, StoreError>;
}
