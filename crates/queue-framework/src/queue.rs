//! # MessageQueue Trait
//!
//! Narrow capability over a message queue with at-least-once delivery: receive a batch of
//! leased messages, delete one by its lease. Production adapters wrap a vendor SDK; tests use
//! [`MockQueue`](crate::mock::MockQueue).

use crate::error::{AcknowledgeError, TransportError};
use crate::message::{Delivery, Lease, ReceiveOptions};
use async_trait::async_trait;

#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Receive up to `options.max_messages` messages, waiting at most `options.wait_time`.
    ///
    /// Returns the messages in the order the queue handed them out. Nothing available within
    /// the wait window is an empty `Vec`, not an error.
    async fn receive_batch(&self, options: &ReceiveOptions) -> Result<Vec<Delivery>, TransportError>;

    /// Remove the leased message so it is not redelivered.
    async fn delete_lease(&self, lease: Lease) -> Result<(), AcknowledgeError>;
}
