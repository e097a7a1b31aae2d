use serde::Serialize;
use std::fmt::Display;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Processing status stored with every order.
///
/// Only the processor sets this; a `status` sent by the producer is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    #[serde(rename = "PROCESSED")]
    Processed,
}

/// An order as written to the store, keyed by `order_id`.
///
/// # Queue Framework
/// This struct implements [`QueueRecord`](queue_framework::QueueRecord), so a
/// [`PollLoop`](queue_framework::PollLoop) can decode it from a queue message and upsert it.
/// See `crate::codec` for the decoding rules. The `Serialize` form is the stored item, one
/// attribute per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub order_id: OrderId,
    pub user_id: String,
    pub amount: i64,
    pub status: OrderStatus,
}

impl OrderRecord {
    /// Creates a processed order.
    pub fn new(order_id: impl Into<String>, user_id: impl Into<String>, amount: i64) -> Self {
        Self {
            order_id: OrderId(order_id.into()),
            user_id: user_id.into(),
            amount,
            status: OrderStatus::Processed,
        }
    }
}
