//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging for the whole process.
//!
//! ## Configuration
//!
//! - **Log level** comes from `RUST_LOG`; `info` when it is unset or invalid.
//! - **Compact format** with spans inline and the module path hidden.
//!
//! ## What Gets Traced
//!
//! - **Loop lifecycle**: start with the receive settings, recovery after receive failures, stop.
//! - **Deliveries**: each message runs inside a `process_delivery` span carrying `msg_id`.
//! - **Failures**: the `error` field holds the display form of the failure.
//!
//! ```bash
//! RUST_LOG=info  cargo run    # start/stop, processed orders, failures
//! RUST_LOG=debug cargo run    # plus empty polls, decoded records, deletes
//! ```
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO poll_loop: Poll loop started max_messages=5 wait_secs=10 lease_secs=60
//! INFO poll_loop:process_delivery: order processed successfully msg_id="3f1c..." order_id="o1" user_id="u1" amount=100
//! ERROR poll_loop:process_delivery: failed to process message - message will be retried or sent to DLQ msg_id="9a0b..." error=invalid payload: expected value at line 1 column 1
//! ```

use tracing_subscriber::EnvFilter;

pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
