//! # Pipeline Errors
//!
//! Every failure the poll loop can observe has its own type, so the loop can decide
//! locally what each one means for the message lease and for the outcome counter:
//!
//! | Error | Raised by | Counted as | Lease |
//! |-------|-----------|------------|-------|
//! | [`ValidationError`] | [`QueueRecord::decode`](crate::QueueRecord::decode) | `error` | left to expire |
//! | [`PersistenceError`] | [`RecordStore::upsert`](crate::RecordStore::upsert) | `error` | left to expire |
//! | [`AcknowledgeError`] | [`MessageQueue::delete_lease`](crate::MessageQueue::delete_lease) | not counted | left to expire |
//! | [`TransportError`] | [`MessageQueue::receive_batch`](crate::MessageQueue::receive_batch) | not counted | none held |
//!
//! Cancellation is not in this list. The loop reports it through
//! [`LoopExit`](crate::LoopExit), never through an `Err`.

/// Boxed source error carried by the adapter-facing error types.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A payload could not be turned into a record.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message body is empty")]
    EmptyPayload,
    #[error("invalid payload: {0}")]
    MalformedPayload(String),
    #[error("{0} is required")]
    MissingRequiredField(&'static str),
}

/// The queue could not be polled.
#[derive(Debug, thiserror::Error)]
#[error("receive message: {source}")]
pub struct TransportError {
    #[source]
    source: BoxError,
}

impl TransportError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// The store rejected an upsert.
#[derive(Debug, thiserror::Error)]
#[error("upsert record: {source}")]
pub struct PersistenceError {
    #[source]
    source: BoxError,
}

impl PersistenceError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// A lease could not be deleted. The message will be redelivered once the lease expires.
#[derive(Debug, thiserror::Error)]
#[error("delete message: {source}")]
pub struct AcknowledgeError {
    #[source]
    source: BoxError,
}

impl AcknowledgeError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Why a single delivery was abandoned.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
