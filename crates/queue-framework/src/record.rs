//! # QueueRecord Trait
//!
//! The domain side of the pipeline. A type implementing [`QueueRecord`] knows how to turn a
//! raw payload into itself and which key it is stored under. The [`PollLoop`](crate::PollLoop)
//! is written once against this trait and reused for any record type.

use crate::error::ValidationError;
use std::fmt::{Debug, Display};

/// A record that arrives on a queue and is persisted by key.
///
/// # Decoding
/// [`decode`](QueueRecord::decode) must be pure: no I/O, no clock, no randomness. The same
/// payload always yields the same record or the same [`ValidationError`]. Producer-supplied
/// values for fields the pipeline owns (for example a processing status) are overwritten here.
///
/// # Provided Methods (Hooks)
/// - [`QueueRecord::on_persisted`] runs after a successful upsert, before the lease is deleted.
///   The default does nothing.
pub trait QueueRecord: Send + Sync + Debug + 'static {
    /// Primary key of the record in the store.
    type Key: Display + Send + Sync;

    /// Parse and validate a message payload.
    fn decode(payload: Option<&[u8]>) -> Result<Self, ValidationError>
    where
        Self: Sized;

    /// The key this record is upserted under.
    fn key(&self) -> &Self::Key;

    /// Called once the record is durably stored.
    fn on_persisted(&self) {}
}
