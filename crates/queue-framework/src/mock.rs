//! # Mock Framework & Testing Guide
//!
//! In-memory stand-ins for the pipeline's external collaborators, so the [`PollLoop`] can be
//! tested without a real queue or store.
//!
//! | Type | Stands in for | Lets you |
//! |------|---------------|----------|
//! | [`MockQueue`] | [`MessageQueue`] | script receive results, fail chosen deletes, count calls |
//! | [`InMemoryStore`] | [`RecordStore`] | inspect stored records, inject write failures |
//! | [`CountingRecorder`] | [`OutcomeRecorder`] | read outcome counts |
//!
//! ## Scripting Receives
//!
//! Each call to [`MockQueue::expect_receive`] queues the result of one receive call. Once the
//! script is used up, every further receive returns an empty batch. Attach a token with
//! [`MockQueue::cancel_when_drained`] to stop the loop at that point:
//!
//! ```rust
//! use queue_framework::mock::{delivery, CountingRecorder, InMemoryStore, MockQueue};
//! use queue_framework::{PollLoop, PollSettings, QueueRecord, ValidationError};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Note { id: String }
//!
//! impl QueueRecord for Note {
//!     type Key = String;
//!     fn decode(payload: Option<&[u8]>) -> Result<Self, ValidationError> {
//!         let bytes = payload.ok_or(ValidationError::EmptyPayload)?;
//!         let id = String::from_utf8(bytes.to_vec())
//!             .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;
//!         Ok(Self { id })
//!     }
//!     fn key(&self) -> &String { &self.id }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let cancel = CancellationToken::new();
//!     let mut queue = MockQueue::new().cancel_when_drained(cancel.clone());
//!     queue.expect_receive().return_batch(vec![delivery("m1", "n1")]);
//!
//!     let queue = Arc::new(queue);
//!     let store = Arc::new(InMemoryStore::<Note>::new());
//!     let recorder = Arc::new(CountingRecorder::new());
//!
//!     let poll_loop =
//!         PollLoop::<Note>::new(queue.clone(), store.clone(), recorder.clone(), PollSettings::default());
//!     poll_loop.run(cancel).await;
//!
//!     assert!(store.get(&"n1".to_string()).is_some());
//!     assert_eq!(queue.deleted(), vec!["m1".to_string()]);
//! }
//! ```

use crate::error::{AcknowledgeError, PersistenceError, TransportError};
use crate::message::{Delivery, Lease, ReceiveOptions};
use crate::outcome::{Outcome, OutcomeRecorder};
use crate::queue::MessageQueue;
use crate::record::QueueRecord;
use crate::store::RecordStore;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Builds a delivery whose lease token is `receipt-<id>`.
pub fn delivery(id: &str, body: &str) -> Delivery {
    Delivery::new(
        Some(body.as_bytes().to_vec()),
        Lease::new(id, format!("receipt-{id}")),
    )
}

/// Builds a delivery that carries no body at all.
pub fn empty_delivery(id: &str) -> Delivery {
    Delivery::new(None, Lease::new(id, format!("receipt-{id}")))
}

// =============================================================================
// QUEUE
// =============================================================================

type ReceiveScript = Arc<Mutex<VecDeque<Result<Vec<Delivery>, TransportError>>>>;

/// A scripted [`MessageQueue`].
pub struct MockQueue {
    receives: ReceiveScript,
    failing_deletes: Mutex<HashSet<String>>,
    deleted: Mutex<Vec<String>>,
    receive_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    drained: Option<CancellationToken>,
}

impl MockQueue {
    pub fn new() -> Self {
        Self {
            receives: Arc::new(Mutex::new(VecDeque::new())),
            failing_deletes: Mutex::new(HashSet::new()),
            deleted: Mutex::new(Vec::new()),
            receive_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            drained: None,
        }
    }

    /// Cancel `token` the first time a receive finds the script empty.
    pub fn cancel_when_drained(mut self, token: CancellationToken) -> Self {
        self.drained = Some(token);
        self
    }

    /// Expects one more `receive_batch` call.
    pub fn expect_receive(&mut self) -> ReceiveExpectationBuilder {
        ReceiveExpectationBuilder {
            receives: self.receives.clone(),
        }
    }

    /// Make every delete of the given delivery id fail.
    pub fn fail_delete(&self, delivery_id: &str) {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(delivery_id.to_string());
    }

    /// Delivery ids deleted so far, in order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    /// Delete attempts, successful or not.
    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Verifies that every scripted receive was consumed.
    pub fn verify(&self) {
        let remaining = self.receives.lock().unwrap().len();
        if remaining != 0 {
            panic!("Not all receive expectations were met. {} remaining", remaining);
        }
    }
}

impl Default for MockQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageQueue for MockQueue {
    async fn receive_batch(&self, options: &ReceiveOptions) -> Result<Vec<Delivery>, TransportError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.receives.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => {
                if let Some(token) = &self.drained {
                    token.cancel();
                }
                // Stand in for the long-poll wait so an idle loop does not spin.
                tokio::time::sleep(options.wait_time.min(Duration::from_millis(10))).await;
                Ok(Vec::new())
            }
        }
    }

    async fn delete_lease(&self, lease: Lease) -> Result<(), AcknowledgeError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .failing_deletes
            .lock()
            .unwrap()
            .contains(lease.delivery_id())
        {
            return Err(AcknowledgeError::new(format!(
                "receipt handle {} is invalid",
                lease.token()
            )));
        }
        self.deleted
            .lock()
            .unwrap()
            .push(lease.delivery_id().to_string());
        Ok(())
    }
}

/// Builder for receive expectations.
pub struct ReceiveExpectationBuilder {
    receives: ReceiveScript,
}

impl ReceiveExpectationBuilder {
    /// The call returns this batch.
    pub fn return_batch(self, batch: Vec<Delivery>) {
        self.receives.lock().unwrap().push_back(Ok(batch));
    }

    /// The call fails with a transport error.
    pub fn return_err(self, message: &str) {
        self.receives
            .lock()
            .unwrap()
            .push_back(Err(TransportError::new(message.to_string())));
    }
}

// =============================================================================
// STORE
// =============================================================================

/// A [`RecordStore`] backed by a `HashMap`, with upsert semantics.
pub struct InMemoryStore<R: QueueRecord> {
    records: Mutex<HashMap<R::Key, R>>,
    failures_left: AtomicUsize,
    upsert_calls: AtomicUsize,
}

impl<R> InMemoryStore<R>
where
    R: QueueRecord + Clone,
    R::Key: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            failures_left: AtomicUsize::new(0),
            upsert_calls: AtomicUsize::new(0),
        }
    }

    /// The next `n` upserts fail without writing.
    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn get(&self, key: &R::Key) -> Option<R> {
        self.records.lock().unwrap().get(key).cloned()
    }

    /// Number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upsert attempts, successful or not.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

impl<R> Default for InMemoryStore<R>
where
    R: QueueRecord + Clone,
    R::Key: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R> RecordStore<R> for InMemoryStore<R>
where
    R: QueueRecord + Clone,
    R::Key: Eq + Hash + Clone,
{
    async fn upsert(&self, record: &R) -> Result<(), PersistenceError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PersistenceError::new("store unavailable"));
        }
        self.records
            .lock()
            .unwrap()
            .insert(record.key().clone(), record.clone());
        Ok(())
    }
}

// =============================================================================
// RECORDER
// =============================================================================

/// An [`OutcomeRecorder`] that only counts.
#[derive(Debug, Default)]
pub struct CountingRecorder {
    success: AtomicU64,
    error: AtomicU64,
}

impl CountingRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Success => self.success.load(Ordering::SeqCst),
            Outcome::Error => self.error.load(Ordering::SeqCst),
        }
    }
}

impl OutcomeRecorder for CountingRecorder {
    fn record(&self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success.fetch_add(1, Ordering::SeqCst),
            Outcome::Error => self.error.fetch_add(1, Ordering::SeqCst),
        };
    }
}
