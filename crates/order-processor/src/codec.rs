//! # Order Message Codec
//!
//! Turns the JSON body of a queue message into an [`OrderRecord`].
//!
//! ```json
//! {"order_id": "o1", "user_id": "u1", "amount": 100}
//! ```
//!
//! | Input | Result |
//! |-------|--------|
//! | no body, or a zero-length body | [`ValidationError::EmptyPayload`] |
//! | not JSON, not an object, or a field of the wrong type | [`ValidationError::MalformedPayload`] |
//! | `order_id` missing, `null`, or `""` | [`ValidationError::MissingRequiredField`] |
//!
//! `user_id` defaults to `""` and `amount` to `0`. Unknown fields are ignored, and the
//! status is always [`OrderStatus::Processed`].

use crate::model::{OrderId, OrderRecord, OrderStatus};
use queue_framework::{QueueRecord, ValidationError};
use serde::Deserialize;
use tracing::info;

/// Wire format published by the order API.
#[derive(Debug, Deserialize)]
struct OrderMessage {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
}

impl QueueRecord for OrderRecord {
    type Key = OrderId;

    fn decode(payload: Option<&[u8]>) -> Result<Self, ValidationError> {
        let bytes = match payload {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(ValidationError::EmptyPayload),
        };

        let message: OrderMessage = serde_json::from_slice(bytes)
            .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;

        let order_id = message
            .order_id
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingRequiredField("order_id"))?;

        Ok(Self {
            order_id: OrderId(order_id),
            user_id: message.user_id.unwrap_or_default(),
            amount: message.amount.unwrap_or_default(),
            status: OrderStatus::Processed,
        })
    }

    fn key(&self) -> &OrderId {
        &self.order_id
    }

    fn on_persisted(&self) {
        info!(
            order_id = %self.order_id,
            user_id = %self.user_id,
            amount = self.amount,
            "order processed successfully"
        );
    }
}
