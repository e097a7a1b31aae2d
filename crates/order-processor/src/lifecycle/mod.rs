//! # Process Lifecycle & Orchestration
//!
//! The [`OrderProcessor`] is the composition root: it turns a
//! [`ProcessorConfig`](crate::config::ProcessorConfig) into running parts and tears them
//! down in order.
//!
//! ## Startup
//!
//! 1. **Metrics** - a fresh [`OrderMetrics`](crate::metrics::OrderMetrics) registry with both
//!    outcome series at zero
//! 2. **Adapters** - SQS and DynamoDB clients from one shared SDK config
//! 3. **Server** - `/health`, `/ready`, and `/metrics` bound and serving
//! 4. **Loop** - a [`PollLoop`](queue_framework::PollLoop) wired to the adapters and metrics
//!
//! Tests use [`OrderProcessor::with_adapters`] to skip step 2 and inject in-memory fakes.
//!
//! ## Shutdown
//!
//! ```text
//! SIGINT / SIGTERM ──▶ CancellationToken ──▶ PollLoop returns LoopExit::Cancelled
//!                                                  │
//!                                                  ▼
//!                                  server.shutdown(grace) ──▶ RunSummary
//! ```
//!
//! A server that does not stop within the grace period is logged and aborted; it never turns
//! a clean cancellation into a failure.

pub mod order_processor;

pub use order_processor::*;
