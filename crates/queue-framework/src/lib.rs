//! # Queue Framework
//!
//! Building blocks for consumers that move records from an at-least-once message queue into
//! a key-value store, exactly-once in effect.
//!
//! ## Why Idempotent Upserts?
//!
//! Queues such as SQS deliver every message *at least* once. A consumer can crash after
//! writing a record but before deleting the message, or the delete itself can fail. Either way
//! the message comes back. Instead of tracking what was already processed, the framework
//! requires the store to **upsert by key**: writing the same record twice leaves exactly one
//! row in the same final state, so a redelivery is harmless.
//!
//! ## Architecture Overview
//!
//! The framework separates concerns into three layers:
//!
//! 1. **Record Layer** ([`QueueRecord`]) - payload decoding, validation, and the storage key
//! 2. **Capability Layer** ([`MessageQueue`], [`RecordStore`], [`OutcomeRecorder`]) - narrow
//!    contracts over the external queue, store, and metrics, independent of any vendor SDK
//! 3. **Orchestration Layer** ([`PollLoop`]) - receive, dispatch, retry, and cancellation
//!
//! You write the decoding rules **once** in the record type and plug in adapters at the
//! composition root. The loop handles everything else.
//!
//! ## Message Lifecycle
//!
//! ```text
//! receive_batch ──▶ decode ──▶ upsert ──▶ record(Success) ──▶ delete_lease
//!                     │          │
//!                     └──────────┴──▶ record(Error), lease left to expire
//! ```
//!
//! A message is deleted only after its record is stored. Anything that fails earlier stays on
//! the queue and is redelivered, or eventually moved to a dead-letter queue by the queue's own
//! redrive policy.
//!
//! ## Concurrency Model
//!
//! - The [`PollLoop`] is a single sequential task: one receive at a time, one message at a time.
//! - The outcome counters are the only state shared with other tasks (for example a metrics
//!   endpoint), and [`OutcomeRecorder`] implementations must be internally synchronized.
//! - Shutdown is cooperative through a [`CancellationToken`](tokio_util::sync::CancellationToken);
//!   see [`shutdown`] for wiring it to SIGINT/SIGTERM.
//!
//! ## Testing
//!
//! The [`mock`] module provides a scripted [`MessageQueue`], an in-memory [`RecordStore`], and a
//! counting [`OutcomeRecorder`], enough to run the real [`PollLoop`] in a unit test.

pub mod error;
pub mod message;
pub mod mock;
pub mod outcome;
pub mod poll_loop;
pub mod queue;
pub mod record;
pub mod shutdown;
pub mod store;
pub mod tracing;

// Re-export core types for convenience
pub use error::{
    AcknowledgeError, BoxError, DeliveryError, PersistenceError, TransportError, ValidationError,
};
pub use message::{Delivery, Lease, ReceiveOptions};
pub use outcome::{Outcome, OutcomeRecorder};
pub use poll_loop::{Acknowledgement, LoopExit, PollLoop, PollSettings};
pub use queue::MessageQueue;
pub use record::QueueRecord;
pub use store::RecordStore;
