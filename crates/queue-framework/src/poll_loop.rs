//! # Poll Loop
//!
//! This module defines the [`PollLoop`], the orchestrator that drains a [`MessageQueue`]
//! into a [`RecordStore`]. It owns the receive cycle, the per-message pipeline, retry
//! backoff, and cooperative cancellation.

use crate::error::DeliveryError;
use crate::message::{Delivery, ReceiveOptions};
use crate::outcome::{Outcome, OutcomeRecorder};
use crate::queue::MessageQueue;
use crate::record::QueueRecord;
use crate::store::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn, Instrument};

/// Tuning knobs of the receive cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Maximum messages requested per receive call.
    pub max_messages: i32,
    /// Long-poll wait of each receive call.
    pub wait_time: Duration,
    /// Visibility timeout applied to received messages.
    pub lease_duration: Duration,
    /// Delay after a failed receive before the next attempt.
    pub retry_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_messages: 5,
            wait_time: Duration::from_secs(10),
            lease_duration: Duration::from_secs(60),
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl PollSettings {
    pub fn receive_options(&self) -> ReceiveOptions {
        ReceiveOptions {
            max_messages: self.max_messages,
            wait_time: self.wait_time,
            lease_duration: self.lease_duration,
        }
    }
}

/// Why [`PollLoop::run`] returned.
///
/// The loop never stops because of a processing failure, so the only variant is the
/// orderly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
}

/// What happened to the lease of a message whose record was persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// The message was deleted from the queue.
    Deleted,
    /// The delete failed; the message becomes visible again when its lease expires.
    LeaseRetained,
}

/// Per-batch tally of [`PollLoop::process_delivery`] results.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct BatchReport {
    deleted: usize,
    /// Persisted, but the delete failed.
    retained: usize,
    /// Rejected by decode or upsert.
    abandoned: usize,
}

/// States of the receive cycle.
#[derive(Debug)]
enum LoopState {
    Idle,
    Receiving,
    Dispatching(Vec<Delivery>),
    BackingOff,
    Stopped,
}

/// The orchestrator that moves records from a queue into a store.
///
/// # Usage Pattern
///
/// 1.  **Create**: [`PollLoop::new`] with the queue, the store, and the outcome recorder.
/// 2.  **Run**: spawn [`PollLoop::run`] with a [`CancellationToken`].
/// 3.  **Stop**: cancel the token; `run` returns [`LoopExit::Cancelled`].
///
/// # State Machine
///
/// ```text
/// Idle ──(cancelled)──────────────────────────────▶ Stopped
///  │
///  ▼
/// Receiving ──(empty batch)──▶ Idle
///  │  │
///  │  └──(transport error)──▶ BackingOff ──(delay)──▶ Idle
///  │                              └──(cancelled)──────▶ Stopped
///  ▼
/// Dispatching ──(batch exhausted)──▶ Idle
/// ```
///
/// Each message in a batch goes through decode → upsert → delete, one at a time and in the
/// order received. A batch that has been fetched is always dispatched completely before
/// cancellation is checked again, so no lease is left half-handled.
///
/// # Failure Handling
///
/// * **Decode or upsert fails**: `error` is recorded, the lease is left to expire, the next
///   message is processed.
/// * **Delete fails**: logged only. `success` was already recorded at persist time, and a
///   redelivery is harmless because the store upserts.
/// * **Receive fails**: logged, then an interruptible backoff of
///   [`PollSettings::retry_delay`]. There is no retry limit.
pub struct PollLoop<R: QueueRecord> {
    queue: Arc<dyn MessageQueue>,
    store: Arc<dyn RecordStore<R>>,
    recorder: Arc<dyn OutcomeRecorder>,
    settings: PollSettings,
}

impl<R: QueueRecord> PollLoop<R> {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        store: Arc<dyn RecordStore<R>>,
        recorder: Arc<dyn OutcomeRecorder>,
        settings: PollSettings,
    ) -> Self {
        Self {
            queue,
            store,
            recorder,
            settings,
        }
    }

    /// Runs the receive cycle until `cancel` fires.
    ///
    /// Cancellation is observed before every receive, while a receive call is waiting, and
    /// during the backoff delay.
    pub async fn run(self, cancel: CancellationToken) -> LoopExit {
        let span = tracing::info_span!("poll_loop");
        async move {
            let options = self.settings.receive_options();
            let mut consecutive_failures: u32 = 0;
            let mut state = LoopState::Idle;
            info!(
                max_messages = options.max_messages,
                wait_secs = options.wait_time.as_secs(),
                lease_secs = options.lease_duration.as_secs(),
                "Poll loop started"
            );

            loop {
                state = match state {
                    LoopState::Idle => {
                        if cancel.is_cancelled() {
                            LoopState::Stopped
                        } else {
                            LoopState::Receiving
                        }
                    }
                    LoopState::Receiving => {
                        let received = tokio::select! {
                            biased;
                            () = cancel.cancelled() => None,
                            result = self.queue.receive_batch(&options) => Some(result),
                        };
                        match received {
                            None => LoopState::Stopped,
                            Some(Ok(batch)) => {
                                if consecutive_failures > 0 {
                                    info!(
                                        previous_errors = consecutive_failures,
                                        "Polling recovered after consecutive errors"
                                    );
                                    consecutive_failures = 0;
                                }
                                if batch.is_empty() {
                                    debug!("Empty poll");
                                    LoopState::Idle
                                } else {
                                    LoopState::Dispatching(batch)
                                }
                            }
                            Some(Err(e)) => {
                                consecutive_failures = consecutive_failures.saturating_add(1);
                                error!(
                                    error = %e,
                                    consecutive_failures,
                                    "poll failed"
                                );
                                LoopState::BackingOff
                            }
                        }
                    }
                    LoopState::Dispatching(batch) => {
                        let report = self.dispatch(batch).await;
                        debug!(
                            deleted = report.deleted,
                            retained = report.retained,
                            abandoned = report.abandoned,
                            "Batch dispatched"
                        );
                        LoopState::Idle
                    }
                    LoopState::BackingOff => {
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => LoopState::Stopped,
                            () = tokio::time::sleep(self.settings.retry_delay) => LoopState::Idle,
                        }
                    }
                    LoopState::Stopped => break,
                };
            }

            info!("Poll loop stopped");
            LoopExit::Cancelled
        }
        .instrument(span)
        .await
    }

    /// Processes a batch in order. A failed message never stops the rest of the batch.
    async fn dispatch(&self, batch: Vec<Delivery>) -> BatchReport {
        debug!(batch_size = batch.len(), "Dispatching batch");
        let mut report = BatchReport::default();
        for delivery in batch {
            match self.process_delivery(delivery).await {
                Ok(Acknowledgement::Deleted) => report.deleted += 1,
                Ok(Acknowledgement::LeaseRetained) => report.retained += 1,
                Err(_) => report.abandoned += 1,
            }
        }
        report
    }

    /// Decode, persist, and acknowledge one delivery.
    ///
    /// Records exactly one outcome per call unless the payload is persisted and only the
    /// delete fails, in which case the single `success` still stands.
    #[instrument(skip_all, fields(msg_id = %delivery.lease.delivery_id()))]
    pub async fn process_delivery(
        &self,
        delivery: Delivery,
    ) -> Result<Acknowledgement, DeliveryError> {
        let Delivery { payload, lease } = delivery;

        let record = match R::decode(payload.as_deref()) {
            Ok(record) => record,
            Err(e) => {
                self.recorder.record(Outcome::Error);
                error!(
                    error = %e,
                    "failed to process message - message will be retried or sent to DLQ"
                );
                return Err(e.into());
            }
        };
        debug!(?record, "Decoded");

        if let Err(e) = self.store.upsert(&record).await {
            self.recorder.record(Outcome::Error);
            error!(
                key = %record.key(),
                error = %e,
                "failed to process message - message will be retried or sent to DLQ"
            );
            return Err(e.into());
        }

        self.recorder.record(Outcome::Success);
        record.on_persisted();

        match self.queue.delete_lease(lease).await {
            Ok(()) => {
                debug!(key = %record.key(), "Deleted");
                Ok(Acknowledgement::Deleted)
            }
            Err(e) => {
                warn!(
                    key = %record.key(),
                    error = %e,
                    "failed to delete message from queue - message may be reprocessed"
                );
                Ok(Acknowledgement::LeaseRetained)
            }
        }
    }
}
