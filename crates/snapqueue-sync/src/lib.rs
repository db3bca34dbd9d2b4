// crates/snapqueue-sync/src/lib.rs
// ============================================================================
// Module: Snapqueue Sync
// Description: Background synchronization of the durable capture queue.
// Purpose: Deliver queued captures and coordinate foreground and worker.
// Dependencies: snapqueue-core, tokio, reqwest, async-trait
// ============================================================================

//! ## Overview
//! `snapqueue-sync` drains a [`QueueStore`](snapqueue_core::QueueStore) against
//! a remote upload endpoint. [`SyncWorker`] runs passes, [`SyncCoordinator`]
//! decides when they run, [`SyncNotifier`] tells every foreground when a pass
//! finished, and [`ForegroundClient`] is the capture-side counterpart.
//! Security posture: endpoint responses are untrusted and classified
//! fail-closed; payloads are never logged.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod connectivity;
pub mod coordinator;
pub mod events;
pub mod foreground;
pub mod notify;
pub mod retry;
pub mod transport;
pub mod worker;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use connectivity::ConnectivityMonitor;
pub use coordinator::CoordinatorError;
pub use coordinator::CoordinatorHandle;
pub use coordinator::SyncCoordinator;
pub use events::FileSyncEventSink;
pub use events::NoopSyncEventSink;
pub use events::StderrSyncEventSink;
pub use events::SyncEvent;
pub use events::SyncEventSink;
pub use foreground::CaptureError;
pub use foreground::CaptureReceipt;
pub use foreground::ForegroundClient;
pub use notify::SyncNotifier;
pub use notify::SyncSubscription;
pub use retry::RetryPolicy;
pub use transport::CatalogClient;
pub use transport::CatalogFetchError;
pub use transport::EndpointResponse;
pub use transport::TransportError;
pub use transport::UploadTransport;
pub use transport::http::HttpCatalogClient;
pub use transport::http::HttpEndpointConfig;
pub use transport::http::HttpUploadTransport;
pub use worker::PassReport;
pub use worker::SyncError;
pub use worker::SyncTrigger;
pub use worker::SyncWorker;
