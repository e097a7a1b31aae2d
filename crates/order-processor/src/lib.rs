//! # Order Processor
//!
//! Moves order events from an SQS queue into a DynamoDB table, exactly-once in effect.
//!
//! ## Core Components
//!
//! - **[model]**: the persisted [`OrderRecord`](model::OrderRecord).
//! - **[codec]**: JSON decoding and validation of queue messages.
//! - **[adapters]**: SQS and DynamoDB implementations of the framework's capability traits.
//! - **[metrics]**: the `orders_processed_total` counter and its Prometheus rendering.
//! - **[server]**: `/health`, `/ready`, and `/metrics`.
//! - **[lifecycle]**: wiring, running, and shutting down all of the above.
//!
//! The receive loop itself, retry, and cancellation live in
//! [`queue_framework::PollLoop`].

pub mod adapters;
pub mod codec;
pub mod config;
pub mod lifecycle;
pub mod metrics;
pub mod model;
pub mod server;
