// crates/snapqueue-sync/src/worker.rs
// ============================================================================
// Module: Snapqueue Sync Worker
// Description: Drains the durable queue against the upload endpoint.
// Purpose: Deliver each pending record at least once without losing any.
// Dependencies: snapqueue-core, tokio, serde, thiserror
// ============================================================================

//! ## Overview
//! A pass snapshots the queue, then attempts every record in the snapshot one
//! at a time, pausing between attempts. A record is removed only after the
//! endpoint confirms it; every other outcome leaves it queued for a later
//! pass. Per-record failures never abort a pass. Failing to open or list the
//! store aborts the pass without a completion notification.
//!
//! Passes may overlap. A per-record single-flight guard keeps one process from
//! sending the same record twice at once; the overlapping pass skips it. Once
//! claimed, a record is re-read from the store so a record that an
//! overlapping pass already confirmed and removed is not sent again.
//! Records inserted after the snapshot wait for the next pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde::Serialize;
use snapqueue_core::DeliveryOutcome;
use snapqueue_core::QueueRecord;
use snapqueue_core::QueueStore;
use snapqueue_core::QueueStoreProvider;
use snapqueue_core::RecordId;
use snapqueue_core::SharedQueueStore;
use snapqueue_core::StoreError;
use snapqueue_core::SyncMessage;
use snapqueue_core::classify_response;
use snapqueue_core::runtime::codec;
use thiserror::Error;

use crate::events::SyncEvent;
use crate::events::SyncEventSink;
use crate::notify::SyncNotifier;
use crate::retry::RetryPolicy;
use crate::transport::UploadTransport;

// ============================================================================
// SECTION: Types
// ============================================================================

/// What started a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    /// Foreground requested a pass.
    Manual,
    /// Periodic timer fired.
    Periodic,
    /// Background context became active.
    Lifecycle,
}

/// Summary of one finished pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Pass identifier, unique within the worker.
    pub pass_id: u64,
    /// Trigger that started the pass.
    pub trigger: SyncTrigger,
    /// Number of records in the snapshot.
    pub snapshot_len: usize,
    /// Records confirmed and removed.
    pub confirmed: usize,
    /// Records with no usable response.
    pub transport_failures: usize,
    /// Records rejected by the endpoint.
    pub server_rejections: usize,
    /// Records whose 2xx response body was not JSON.
    pub decode_failures: usize,
    /// Records confirmed but not removed; they will be resent.
    pub remove_failures: usize,
    /// Records skipped because another pass was delivering them.
    pub skipped_in_flight: usize,
    /// Records skipped because they were already marked synced.
    pub skipped_synced: usize,
    /// Records skipped because an overlapping pass already removed them.
    pub skipped_removed: usize,
}

impl PassReport {
    /// Creates an empty report for a pass.
    const fn new(pass_id: u64, trigger: SyncTrigger, snapshot_len: usize) -> Self {
        Self {
            pass_id,
            trigger,
            snapshot_len,
            confirmed: 0,
            transport_failures: 0,
            server_rejections: 0,
            decode_failures: 0,
            remove_failures: 0,
            skipped_in_flight: 0,
            skipped_synced: 0,
            skipped_removed: 0,
        }
    }

    /// Returns the number of records that remain queued after this pass.
    #[must_use]
    pub const fn still_pending(&self) -> usize {
        self.transport_failures
            + self.server_rejections
            + self.decode_failures
            + self.remove_failures
            + self.skipped_in_flight
    }
}

/// Errors that abort a pass.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Per-record failures never produce a `SyncError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Backing store could not be opened.
    #[error("queue store unavailable: {0}")]
    StoreUnavailable(String),
    /// Snapshot could not be read.
    #[error("queue store io error: {0}")]
    StoreIo(String),
}

// ============================================================================
// SECTION: Single-Flight Guard
// ============================================================================

/// Set of record identifiers currently being delivered.
type InFlight = Arc<Mutex<HashSet<RecordId>>>;

/// Exclusive claim on delivering one record; released on drop.
struct InFlightClaim {
    /// Shared in-flight set.
    in_flight: InFlight,
    /// Claimed record.
    id: RecordId,
}

impl InFlightClaim {
    /// Claims a record; returns `None` when another pass holds it.
    fn acquire(in_flight: &InFlight, id: RecordId) -> Option<Self> {
        let inserted = in_flight.lock().unwrap_or_else(PoisonError::into_inner).insert(id);
        inserted.then(|| Self {
            in_flight: Arc::clone(in_flight),
            id,
        })
    }
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.id);
    }
}

// ============================================================================
// SECTION: Worker
// ============================================================================

/// Background sync worker.
pub struct SyncWorker {
    /// Store provider used for each pass.
    provider: Arc<dyn QueueStoreProvider>,
    /// Upload transport.
    transport: Arc<dyn UploadTransport>,
    /// Pass-complete publisher.
    notifier: SyncNotifier,
    /// Pacing and timeout policy.
    policy: RetryPolicy,
    /// Structured event sink.
    events: Arc<dyn SyncEventSink>,
    /// Records currently being delivered.
    in_flight: InFlight,
    /// Last assigned pass identifier.
    pass_counter: AtomicU64,
}

impl SyncWorker {
    /// Creates a worker.
    #[must_use]
    pub fn new(
        provider: Arc<dyn QueueStoreProvider>,
        transport: Arc<dyn UploadTransport>,
        notifier: SyncNotifier,
        policy: RetryPolicy,
        events: Arc<dyn SyncEventSink>,
    ) -> Self {
        Self {
            provider,
            transport,
            notifier,
            policy,
            events,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            pass_counter: AtomicU64::new(0),
        }
    }

    /// Returns the notifier used for pass-complete messages.
    #[must_use]
    pub const fn notifier(&self) -> &SyncNotifier {
        &self.notifier
    }

    /// Returns the worker's pacing policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns the worker's event sink.
    #[must_use]
    pub fn events(&self) -> &dyn SyncEventSink {
        self.events.as_ref()
    }

    /// Runs one pass over the current queue snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the store cannot be opened or listed. No
    /// completion notification is published in that case.
    pub async fn run_pass(&self, trigger: SyncTrigger) -> Result<PassReport, SyncError> {
        let pass_id = self.pass_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        self.events.record(&SyncEvent::pass_started(pass_id, trigger));
        let (store, snapshot) = match self.snapshot().await {
            Ok(value) => value,
            Err(err) => {
                self.events.record(&SyncEvent::pass_aborted(pass_id, trigger, &err.to_string()));
                return Err(err);
            }
        };
        let mut report = PassReport::new(pass_id, trigger, snapshot.len());
        let mut attempted_any = false;
        for record in snapshot {
            if record.synced {
                report.skipped_synced += 1;
                self.events.record(&SyncEvent::record_already_synced(pass_id, record.id));
                continue;
            }
            let Some(claim) = InFlightClaim::acquire(&self.in_flight, record.id) else {
                report.skipped_in_flight += 1;
                self.events.record(&SyncEvent::record_in_flight(pass_id, record.id));
                continue;
            };
            if !still_queued(&store, record.id).await {
                report.skipped_removed += 1;
                self.events.record(&SyncEvent::record_already_removed(pass_id, record.id));
                continue;
            }
            if attempted_any && !self.policy.inter_record_delay.is_zero() {
                tokio::time::sleep(self.policy.inter_record_delay).await;
            }
            attempted_any = true;
            let outcome = self.deliver(&record).await;
            self.events.record(&SyncEvent::record_outcome(pass_id, record.id, &outcome));
            match outcome {
                DeliveryOutcome::Confirmed => match remove_record(&store, record.id).await {
                    Ok(()) => report.confirmed += 1,
                    Err(err) => {
                        report.remove_failures += 1;
                        self.events.record(&SyncEvent::remove_failed(
                            pass_id,
                            record.id,
                            &err.to_string(),
                        ));
                    }
                },
                DeliveryOutcome::TransportFailure {
                    ..
                } => report.transport_failures += 1,
                DeliveryOutcome::ServerRejected {
                    ..
                } => report.server_rejections += 1,
                DeliveryOutcome::DecodeFailure {
                    ..
                } => report.decode_failures += 1,
            }
            drop(claim);
        }
        self.notifier.publish(SyncMessage::SyncComplete);
        self.events.record(&SyncEvent::pass_completed(&report));
        Ok(report)
    }

    /// Acquires the store and snapshots every stored record.
    async fn snapshot(&self) -> Result<(SharedQueueStore, Vec<QueueRecord>), SyncError> {
        let provider = Arc::clone(&self.provider);
        let result = tokio::task::spawn_blocking(move || {
            let store = provider.acquire().map_err(|err| match err {
                StoreError::Unavailable(message) => SyncError::StoreUnavailable(message),
                other => SyncError::StoreUnavailable(other.to_string()),
            })?;
            let records = store.list_all().map_err(|err| SyncError::StoreIo(err.to_string()))?;
            Ok((store, records))
        })
        .await;
        match result {
            Ok(value) => value,
            Err(err) => Err(SyncError::StoreIo(format!("store task failed: {err}"))),
        }
    }

    /// Sends one record and classifies the result.
    async fn deliver(&self, record: &QueueRecord) -> DeliveryOutcome {
        let form = codec::decode(record);
        match tokio::time::timeout(self.policy.request_timeout, self.transport.send(&form)).await {
            Err(_) => DeliveryOutcome::TransportFailure {
                reason: format!(
                    "request timed out after {} ms",
                    self.policy.request_timeout.as_millis()
                ),
            },
            Ok(Err(err)) => DeliveryOutcome::TransportFailure {
                reason: err.to_string(),
            },
            Ok(Ok(response)) => classify_response(response.status, &response.body),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns false when the record is gone from the store.
///
/// A failed re-read keeps the snapshot copy eligible for delivery.
async fn still_queued(store: &SharedQueueStore, id: RecordId) -> bool {
    let store = store.clone();
    !matches!(tokio::task::spawn_blocking(move || store.get(id)).await, Ok(Ok(None)))
}

/// Removes a record on the blocking pool.
async fn remove_record(store: &SharedQueueStore, id: RecordId) -> Result<(), StoreError> {
    let store = store.clone();
    tokio::task::spawn_blocking(move || store.remove(id))
        .await
        .unwrap_or_else(|err| Err(StoreError::Io(format!("store task failed: {err}"))))
}
