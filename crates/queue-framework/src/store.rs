//! # RecordStore Trait

use crate::error::PersistenceError;
use crate::record::QueueRecord;
use async_trait::async_trait;

/// Narrow capability over a durable key-value store.
///
/// # Dependency Contract
/// Implementations must give `upsert` overwrite semantics: writing a record whose key
/// already exists replaces the stored value and never fails with a duplicate-key error.
/// The poll loop does not deduplicate redelivered messages; it relies on this property to
/// make at-least-once delivery safe.
#[async_trait]
pub trait RecordStore<R: QueueRecord>: Send + Sync {
    /// Insert or overwrite the record under `record.key()` as one logical write.
    async fn upsert(&self, record: &R) -> Result<(), PersistenceError>;
}
