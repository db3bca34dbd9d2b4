// crates/snapqueue-sync/src/foreground.rs
// ============================================================================
// Module: Snapqueue Foreground Client
// Description: Capture flow and gallery view over the shared queue.
// Purpose: Queue captures durably and cue the worker without blocking the caller.
// Dependencies: snapqueue-core, tokio, thiserror
// ============================================================================

//! ## Overview
//! The foreground talks to the worker only through the coordinator's message
//! channel, the notification subscription, and the shared durable store.
//! A capture is validated, encoded, and committed before any sync is
//! requested; a sync request is sent only while online.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use snapqueue_core::CodecError;
use snapqueue_core::GalleryEntry;
use snapqueue_core::ProtocolEnvelope;
use snapqueue_core::QueueRecord;
use snapqueue_core::QueueStore;
use snapqueue_core::QueueStoreProvider;
use snapqueue_core::RawCapture;
use snapqueue_core::RecordId;
use snapqueue_core::StoreError;
use snapqueue_core::SyncMessage;
use snapqueue_core::runtime::codec;
use snapqueue_core::runtime::gallery;
use thiserror::Error;

use crate::connectivity::ConnectivityMonitor;
use crate::coordinator::CoordinatorHandle;
use crate::coordinator::SyncCoordinator;
use crate::events::SyncEvent;
use crate::events::SyncEventSink;
use crate::notify::SyncSubscription;
use crate::transport::CatalogClient;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Capture flow errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Any error means nothing was queued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No capture was supplied.
    #[error("no capture selected")]
    MissingCapture,
    /// Capture or caption failed validation.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Record could not be committed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successful capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureReceipt {
    /// Identifier of the queued record.
    pub id: RecordId,
    /// Whether a manual sync was requested.
    pub sync_requested: bool,
}

// ============================================================================
// SECTION: Foreground Client
// ============================================================================

/// Foreground view of the queue.
pub struct ForegroundClient {
    /// Store provider shared with the worker.
    provider: Arc<dyn QueueStoreProvider>,
    /// Channel to the coordinator.
    coordinator: CoordinatorHandle,
    /// Connectivity flag.
    connectivity: ConnectivityMonitor,
    /// Pass-complete notifications.
    subscription: SyncSubscription,
    /// Structured event sink.
    events: Arc<dyn SyncEventSink>,
}

impl ForegroundClient {
    /// Connects a foreground to a running coordinator.
    #[must_use]
    pub fn connect(
        coordinator: &SyncCoordinator,
        provider: Arc<dyn QueueStoreProvider>,
        events: Arc<dyn SyncEventSink>,
    ) -> Self {
        Self {
            provider,
            coordinator: coordinator.handle(),
            connectivity: coordinator.connectivity().clone(),
            subscription: coordinator.subscribe(),
            events,
        }
    }

    /// Validates, encodes, and queues a capture, then requests a sync if online.
    ///
    /// Completion notices buffered before the request are discarded, so a
    /// following [`wait_for_sync_complete`](Self::wait_for_sync_complete)
    /// waits for a pass that started after this capture was queued.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] when the capture is missing or invalid, or the
    /// record cannot be committed.
    pub async fn capture(
        &mut self,
        raw: Option<RawCapture>,
        caption: &str,
    ) -> Result<CaptureReceipt, CaptureError> {
        let raw = raw.ok_or(CaptureError::MissingCapture)?;
        let record = codec::encode(&raw, caption)?;
        let provider = Arc::clone(&self.provider);
        let id = tokio::task::spawn_blocking(move || provider.acquire()?.insert(record))
            .await
            .unwrap_or_else(|err| Err(StoreError::Io(format!("store task failed: {err}"))))?;
        while self.subscription.try_recv().is_some() {}
        let sync_requested =
            self.connectivity.is_online() && self.request_sync().is_ok();
        self.events.record(&SyncEvent::capture_stored(id, sync_requested));
        Ok(CaptureReceipt {
            id,
            sync_requested,
        })
    }

    /// Lists records still waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    pub async fn pending(&self) -> Result<Vec<QueueRecord>, StoreError> {
        let provider = Arc::clone(&self.provider);
        tokio::task::spawn_blocking(move || provider.acquire()?.list_all())
            .await
            .unwrap_or_else(|err| Err(StoreError::Io(format!("store task failed: {err}"))))
    }

    /// Asks the worker for a pass.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoordinatorError::Closed`] when the coordinator is gone.
    pub fn request_sync(&self) -> Result<(), crate::CoordinatorError> {
        self.coordinator.post(SyncMessage::SyncNow)
    }

    /// Waits for the next pass-complete notification.
    pub async fn wait_for_sync_complete(&mut self) -> Option<ProtocolEnvelope> {
        self.subscription.wait_for_sync_complete().await
    }

    /// Builds the gallery from pending records and the remote catalog.
    ///
    /// A catalog failure is logged and yields a gallery of pending records only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the local queue cannot be read.
    pub async fn gallery(&self, catalog: &dyn CatalogClient) -> Result<Vec<GalleryEntry>, StoreError> {
        let local = self.pending().await?;
        let remote = match catalog.fetch().await {
            Ok(items) => items,
            Err(err) => {
                self.events.record(&SyncEvent::catalog_unavailable(&err.to_string()));
                Vec::new()
            }
        };
        Ok(gallery::merge(&local, &remote))
    }
}
