//! # Deliveries and Leases
//!
//! A [`Delivery`] is one message handed out by a single receive call, together with the
//! [`Lease`] that proves this consumer currently owns it. The lease is the only way to
//! remove the message from the queue.

use std::time::Duration;

/// Time-bounded, single-use claim on a received message.
///
/// `Lease` is intentionally not `Clone`: [`MessageQueue::delete_lease`](crate::MessageQueue::delete_lease)
/// consumes it, so a lease cannot be acknowledged twice or carried into a later receive.
#[derive(Debug, PartialEq, Eq)]
pub struct Lease {
    delivery_id: String,
    token: String,
}

impl Lease {
    pub fn new(delivery_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            delivery_id: delivery_id.into(),
            token: token.into(),
        }
    }

    /// Queue-assigned id of this delivery, used for log correlation.
    pub fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    /// Opaque token the queue expects back on delete.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// A leased message as returned from [`MessageQueue::receive_batch`](crate::MessageQueue::receive_batch).
#[derive(Debug)]
pub struct Delivery {
    /// Raw message body. `None` when the queue returned no body at all.
    pub payload: Option<Vec<u8>>,
    pub lease: Lease,
}

impl Delivery {
    pub fn new(payload: Option<Vec<u8>>, lease: Lease) -> Self {
        Self { payload, lease }
    }
}

/// Parameters of one receive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveOptions {
    /// Upper bound on the batch size.
    pub max_messages: i32,
    /// How long the call may wait for messages before returning an empty batch.
    pub wait_time: Duration,
    /// How long received messages stay hidden from other consumers.
    pub lease_duration: Duration,
}
