use async_trait::async_trait;
use queue_framework::mock::{delivery, empty_delivery, CountingRecorder, InMemoryStore, MockQueue};
use queue_framework::{
    AcknowledgeError, Acknowledgement, Delivery, DeliveryError, Lease, LoopExit, MessageQueue,
    Outcome, PersistenceError, PollLoop, PollSettings, QueueRecord, ReceiveOptions, RecordStore,
    TransportError, ValidationError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// --- Test Record ---

/// `<id>:<body>` in UTF-8.
#[derive(Clone, Debug, PartialEq)]
struct Ticket {
    id: String,
    body: String,
}

impl QueueRecord for Ticket {
    type Key = String;

    fn decode(payload: Option<&[u8]>) -> Result<Self, ValidationError> {
        let bytes = payload.ok_or(ValidationError::EmptyPayload)?;
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;
        let (id, body) = text
            .split_once(':')
            .ok_or_else(|| ValidationError::MalformedPayload("missing ':'".into()))?;
        if id.is_empty() {
            return Err(ValidationError::MissingRequiredField("id"));
        }
        Ok(Self {
            id: id.to_string(),
            body: body.to_string(),
        })
    }

    fn key(&self) -> &String {
        &self.id
    }
}

struct Harness {
    queue: Arc<MockQueue>,
    store: Arc<InMemoryStore<Ticket>>,
    recorder: Arc<CountingRecorder>,
}

impl Harness {
    fn new(queue: MockQueue) -> Self {
        Self {
            queue: Arc::new(queue),
            store: Arc::new(InMemoryStore::new()),
            recorder: Arc::new(CountingRecorder::new()),
        }
    }

    fn poll_loop(&self, settings: PollSettings) -> PollLoop<Ticket> {
        PollLoop::<Ticket>::new(
            self.queue.clone(),
            self.store.clone(),
            self.recorder.clone(),
            settings,
        )
    }
}

fn fast_settings() -> PollSettings {
    PollSettings {
        wait_time: Duration::from_millis(5),
        retry_delay: Duration::from_millis(5),
        ..PollSettings::default()
    }
}

// --- Loop Tests ---

#[tokio::test]
async fn test_batch_is_persisted_and_acknowledged_in_order() {
    let cancel = CancellationToken::new();
    let mut queue = MockQueue::new().cancel_when_drained(cancel.clone());
    queue
        .expect_receive()
        .return_batch(vec![delivery("m1", "t1:first"), delivery("m2", "t2:second")]);
    let h = Harness::new(queue);

    let exit = h.poll_loop(fast_settings()).run(cancel).await;

    assert_eq!(exit, LoopExit::Cancelled);
    assert_eq!(h.store.len(), 2);
    assert_eq!(h.store.get(&"t2".to_string()).unwrap().body, "second");
    assert_eq!(h.queue.deleted(), vec!["m1".to_string(), "m2".to_string()]);
    assert_eq!(h.recorder.count(Outcome::Success), 2);
    assert_eq!(h.recorder.count(Outcome::Error), 0);
    h.queue.verify();
}

#[tokio::test]
async fn test_invalid_message_does_not_stop_the_batch() {
    let cancel = CancellationToken::new();
    let mut queue = MockQueue::new().cancel_when_drained(cancel.clone());
    queue.expect_receive().return_batch(vec![
        delivery("m1", "no separator"),
        empty_delivery("m2"),
        delivery("m3", ":no id"),
        delivery("m4", "t4:ok"),
    ]);
    let h = Harness::new(queue);

    h.poll_loop(fast_settings()).run(cancel).await;

    assert_eq!(h.recorder.count(Outcome::Error), 3);
    assert_eq!(h.recorder.count(Outcome::Success), 1);
    assert_eq!(h.store.upsert_calls(), 1);
    assert_eq!(h.queue.deleted(), vec!["m4".to_string()]);
}

#[tokio::test]
async fn test_store_failure_leaves_message_on_queue() {
    let cancel = CancellationToken::new();
    let mut queue = MockQueue::new().cancel_when_drained(cancel.clone());
    queue.expect_receive().return_batch(vec![delivery("m1", "t1:x")]);
    let h = Harness::new(queue);
    h.store.fail_next(1);

    h.poll_loop(fast_settings()).run(cancel).await;

    assert_eq!(h.recorder.count(Outcome::Error), 1);
    assert_eq!(h.recorder.count(Outcome::Success), 0);
    assert!(h.store.is_empty());
    assert_eq!(h.queue.delete_calls(), 0);
}

#[tokio::test]
async fn test_redelivery_after_failed_delete_upserts_same_key() {
    let cancel = CancellationToken::new();
    let mut queue = MockQueue::new().cancel_when_drained(cancel.clone());
    queue.expect_receive().return_batch(vec![delivery("m1", "t1:v1")]);
    queue.expect_receive().return_batch(vec![delivery("m1-again", "t1:v1")]);
    queue.fail_delete("m1");
    let h = Harness::new(queue);

    h.poll_loop(fast_settings()).run(cancel).await;

    assert_eq!(h.recorder.count(Outcome::Success), 2);
    assert_eq!(h.recorder.count(Outcome::Error), 0);
    assert_eq!(h.store.len(), 1);
    assert_eq!(h.store.upsert_calls(), 2);
    assert_eq!(h.queue.delete_calls(), 2);
    assert_eq!(h.queue.deleted(), vec!["m1-again".to_string()]);
}

#[tokio::test]
async fn test_transport_error_backs_off_and_recovers() {
    let cancel = CancellationToken::new();
    let mut queue = MockQueue::new().cancel_when_drained(cancel.clone());
    queue.expect_receive().return_err("connection reset");
    queue.expect_receive().return_err("connection reset");
    queue.expect_receive().return_batch(vec![delivery("m1", "t1:x")]);
    let h = Harness::new(queue);

    let exit = h.poll_loop(fast_settings()).run(cancel).await;

    assert_eq!(exit, LoopExit::Cancelled);
    assert_eq!(h.store.len(), 1);
    // Two failures, one batch, one drained receive.
    assert_eq!(h.queue.receive_calls(), 4);
    // Transport errors are not message outcomes.
    assert_eq!(h.recorder.count(Outcome::Error), 0);
}

#[tokio::test]
async fn test_cancel_before_start_issues_no_calls() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut queue = MockQueue::new();
    queue.expect_receive().return_batch(vec![delivery("m1", "t1:x")]);
    let h = Harness::new(queue);

    let exit = h.poll_loop(fast_settings()).run(cancel).await;

    assert_eq!(exit, LoopExit::Cancelled);
    assert_eq!(h.queue.receive_calls(), 0);
    assert_eq!(h.store.upsert_calls(), 0);
    assert_eq!(h.queue.delete_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_is_interrupted_by_cancellation() {
    let cancel = CancellationToken::new();
    let mut queue = MockQueue::new();
    queue.expect_receive().return_err("throttled");
    let h = Harness::new(queue);
    let settings = PollSettings {
        retry_delay: Duration::from_secs(60),
        ..fast_settings()
    };

    let started = tokio::time::Instant::now();
    let handle = tokio::spawn(h.poll_loop(settings).run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();
    let exit = handle.await.unwrap();

    assert_eq!(exit, LoopExit::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(h.queue.receive_calls(), 1);
}

// --- Custom Collaborators ---

/// A queue whose receive never completes.
struct StalledQueue {
    receive_calls: AtomicUsize,
}

#[async_trait]
impl MessageQueue for StalledQueue {
    async fn receive_batch(&self, _: &ReceiveOptions) -> Result<Vec<Delivery>, TransportError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn delete_lease(&self, _: Lease) -> Result<(), AcknowledgeError> {
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_interrupts_waiting_receive() {
    let cancel = CancellationToken::new();
    let queue = Arc::new(StalledQueue {
        receive_calls: AtomicUsize::new(0),
    });
    let poll_loop = PollLoop::<Ticket>::new(
        queue.clone(),
        Arc::new(InMemoryStore::<Ticket>::new()),
        Arc::new(CountingRecorder::new()),
        PollSettings::default(),
    );

    let handle = tokio::spawn(poll_loop.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    assert_eq!(handle.await.unwrap(), LoopExit::Cancelled);
    assert_eq!(queue.receive_calls.load(Ordering::SeqCst), 1);
}

/// A store that requests shutdown on its first write.
struct CancellingStore {
    inner: InMemoryStore<Ticket>,
    cancel: CancellationToken,
}

#[async_trait]
impl RecordStore<Ticket> for CancellingStore {
    async fn upsert(&self, record: &Ticket) -> Result<(), PersistenceError> {
        self.cancel.cancel();
        self.inner.upsert(record).await
    }
}

#[tokio::test]
async fn test_fetched_batch_finishes_after_cancellation() {
    let cancel = CancellationToken::new();
    let mut queue = MockQueue::new();
    queue
        .expect_receive()
        .return_batch(vec![delivery("m1", "t1:a"), delivery("m2", "t2:b")]);
    let queue = Arc::new(queue);
    let store = Arc::new(CancellingStore {
        inner: InMemoryStore::new(),
        cancel: cancel.clone(),
    });
    let poll_loop = PollLoop::<Ticket>::new(
        queue.clone(),
        store.clone(),
        Arc::new(CountingRecorder::new()),
        fast_settings(),
    );

    poll_loop.run(cancel).await;

    assert_eq!(store.inner.len(), 2);
    assert_eq!(queue.deleted(), vec!["m1".to_string(), "m2".to_string()]);
    assert_eq!(queue.receive_calls(), 1);
}

// --- Single Delivery ---

#[tokio::test]
async fn test_process_delivery_reports_each_stage() {
    let mut queue = MockQueue::new();
    queue.fail_delete("m3");
    let h = Harness::new(queue);
    let poll_loop = h.poll_loop(fast_settings());

    let rejected = poll_loop.process_delivery(empty_delivery("m1")).await;
    assert!(matches!(
        rejected,
        Err(DeliveryError::Validation(ValidationError::EmptyPayload))
    ));

    h.store.fail_next(1);
    let failed = poll_loop.process_delivery(delivery("m2", "t2:x")).await;
    assert!(matches!(failed, Err(DeliveryError::Persistence(_))));

    let retained = poll_loop.process_delivery(delivery("m3", "t3:x")).await;
    assert_eq!(retained.unwrap(), Acknowledgement::LeaseRetained);

    let deleted = poll_loop.process_delivery(delivery("m4", "t4:x")).await;
    assert_eq!(deleted.unwrap(), Acknowledgement::Deleted);

    assert_eq!(h.recorder.count(Outcome::Error), 2);
    assert_eq!(h.recorder.count(Outcome::Success), 2);
}
