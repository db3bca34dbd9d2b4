// crates/snapqueue-sync/tests/common/mod.rs
// ============================================================================
// Module: Sync Test Helpers
// Description: Scripted transports, stores, and sinks for sync tests.
// Purpose: Reduce duplication across integration tests for snapqueue-sync.
// ============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use snapqueue_core::CatalogItem;
use snapqueue_core::DeliveryForm;
use snapqueue_core::InMemoryQueueStore;
use snapqueue_core::NewRecord;
use snapqueue_core::QueueRecord;
use snapqueue_core::QueueStore;
use snapqueue_core::QueueStoreProvider;
use snapqueue_core::RawCapture;
use snapqueue_core::RecordId;
use snapqueue_core::SharedQueueStore;
use snapqueue_core::StoreError;
use snapqueue_core::runtime::codec;
use snapqueue_sync::CatalogClient;
use snapqueue_sync::CatalogFetchError;
use snapqueue_sync::EndpointResponse;
use snapqueue_sync::RetryPolicy;
use snapqueue_sync::SyncEvent;
use snapqueue_sync::SyncEventSink;
use snapqueue_sync::SyncNotifier;
use snapqueue_sync::SyncWorker;
use snapqueue_sync::TransportError;
use snapqueue_sync::UploadTransport;
use tokio::sync::Notify;

/// Success body understood by the delivery classifier.
pub const SUCCESS_BODY: &str = r#"{"code":"success"}"#;

/// Scripted reply for one caption.
#[derive(Clone)]
pub enum Reply {
    /// Respond with a status and body.
    Json(u16, &'static str),
    /// Fail without a response.
    Fail,
    /// Never respond.
    Hang,
    /// Respond with success once the gate is notified.
    Gate(Arc<Notify>),
}

/// Hook run on the first send.
type SendHook = Box<dyn FnOnce() + Send>;

/// Upload transport answering by caption.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, Reply>>,
    sent: Mutex<Vec<DeliveryForm>>,
    hook: Mutex<Option<SendHook>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, caption: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(caption.to_string(), reply);
    }

    pub fn on_first_send(&self, hook: impl FnOnce() + Send + 'static) {
        *self.hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn sent(&self) -> Vec<DeliveryForm> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_captions(&self) -> Vec<String> {
        self.sent().into_iter().map(|form| form.caption).collect()
    }
}

#[async_trait]
impl UploadTransport for ScriptedTransport {
    async fn send(&self, form: &DeliveryForm) -> Result<EndpointResponse, TransportError> {
        self.sent.lock().unwrap().push(form.clone());
        let hook = self.hook.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&form.caption)
            .cloned()
            .unwrap_or(Reply::Json(200, SUCCESS_BODY));
        match reply {
            Reply::Json(status, body) => Ok(EndpointResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            Reply::Fail => Err(TransportError::Transport("connection refused".to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(TransportError::Transport("hung".to_string()))
            }
            Reply::Gate(gate) => {
                gate.notified().await;
                Ok(EndpointResponse {
                    status: 200,
                    body: SUCCESS_BODY.as_bytes().to_vec(),
                })
            }
        }
    }
}

/// Event sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SyncEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|event| event.event).collect()
    }

    pub fn events(&self) -> Vec<SyncEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl SyncEventSink for RecordingSink {
    fn record(&self, event: &SyncEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Provider whose store can never be opened.
pub struct UnavailableProvider;

impl QueueStoreProvider for UnavailableProvider {
    fn acquire(&self) -> Result<SharedQueueStore, StoreError> {
        Err(StoreError::Unavailable("disk detached".to_string()))
    }
}

/// Store whose deletions always fail.
#[derive(Default)]
pub struct StickyStore {
    inner: InMemoryQueueStore,
}

impl QueueStore for StickyStore {
    fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError> {
        self.inner.insert(record)
    }

    fn list_all(&self) -> Result<Vec<QueueRecord>, StoreError> {
        self.inner.list_all()
    }

    fn remove(&self, _id: RecordId) -> Result<(), StoreError> {
        Err(StoreError::Io("disk full".to_string()))
    }

    fn get(&self, id: RecordId) -> Result<Option<QueueRecord>, StoreError> {
        self.inner.get(id)
    }
}

/// Catalog client returning a fixed result.
pub struct StaticCatalog {
    pub result: Result<Vec<CatalogItem>, CatalogFetchError>,
}

#[async_trait]
impl CatalogClient for StaticCatalog {
    async fn fetch(&self) -> Result<Vec<CatalogItem>, CatalogFetchError> {
        self.result.clone()
    }
}

/// Builds record contents for a caption.
pub fn record(caption: &str) -> NewRecord {
    codec::encode(&raw_capture(caption), caption).unwrap()
}

/// Builds a raw capture whose bytes are derived from the caption.
pub fn raw_capture(caption: &str) -> RawCapture {
    RawCapture {
        bytes: format!("pixels-of-{caption}").into_bytes(),
        filename: format!("{caption}.jpg"),
        mime_type: Some("image/jpeg".to_string()),
    }
}

/// Policy with no pacing delay and a short request timeout.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        inter_record_delay: Duration::ZERO,
        request_timeout: Duration::from_millis(200),
        periodic_interval: Duration::from_millis(50),
    }
}

/// Builds a worker over a shared store.
pub fn worker(
    store: &SharedQueueStore,
    transport: &Arc<ScriptedTransport>,
    sink: &Arc<RecordingSink>,
) -> SyncWorker {
    SyncWorker::new(
        Arc::new(store.clone()),
        Arc::clone(transport) as Arc<dyn UploadTransport>,
        SyncNotifier::default(),
        fast_policy(),
        Arc::clone(sink) as Arc<dyn SyncEventSink>,
    )
}

/// Returns an in-memory shared store.
pub fn memory_store() -> SharedQueueStore {
    SharedQueueStore::from_store(InMemoryQueueStore::new())
}
