// crates/snapqueue-sync/tests/foreground.rs
// ============================================================================
// Module: Foreground Client Tests
// Description: Validate the capture flow and gallery view.
// Purpose: Ensure captures are committed before sync and never lost offline.
// Dependencies: snapqueue-sync, snapqueue-core, tokio
// ============================================================================

//! ## Overview
//! Connects a foreground client to a running coordinator and checks that
//! captures are queued durably, sync requests follow connectivity, and the
//! gallery degrades to local entries when the catalog is unreachable.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use common::RecordingSink;
use common::Reply;
use common::ScriptedTransport;
use common::StaticCatalog;
use common::raw_capture;
use snapqueue_core::CatalogItem;
use snapqueue_core::CodecError;
use snapqueue_core::EntryState;
use snapqueue_core::QueueStore;
use snapqueue_core::QueueStoreProvider;
use snapqueue_core::RemoteId;
use snapqueue_core::SharedQueueStore;
use snapqueue_sync::CaptureError;
use snapqueue_sync::CatalogFetchError;
use snapqueue_sync::ConnectivityMonitor;
use snapqueue_sync::ForegroundClient;
use snapqueue_sync::SyncCoordinator;
use snapqueue_sync::SyncEventSink;
use snapqueue_sync::SyncTrigger;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Running coordinator with a connected foreground.
struct Harness {
    store: SharedQueueStore,
    transport: Arc<ScriptedTransport>,
    sink: Arc<RecordingSink>,
    coordinator: SyncCoordinator,
    client: ForegroundClient,
}

async fn harness(online: bool) -> Harness {
    let store = common::memory_store();
    let transport = ScriptedTransport::new();
    let sink = RecordingSink::new();
    let coordinator = SyncCoordinator::new(
        common::worker(&store, &transport, &sink),
        ConnectivityMonitor::new(online),
    );
    coordinator.activate().await.unwrap();
    let client = ForegroundClient::connect(
        &coordinator,
        Arc::new(store.clone()) as Arc<dyn QueueStoreProvider>,
        Arc::clone(&sink) as Arc<dyn SyncEventSink>,
    );
    Harness {
        store,
        transport,
        sink,
        coordinator,
        client,
    }
}

fn remote_item(id: u64, caption: &str) -> CatalogItem {
    CatalogItem {
        id: RemoteId::Number(id),
        image_url: format!("https://cdn.example/{id}.jpg"),
        caption: caption.to_string(),
    }
}

// ============================================================================
// SECTION: Capture
// ============================================================================

#[tokio::test]
async fn online_capture_is_queued_then_delivered() {
    let mut harness = harness(true).await;

    let receipt = harness.client.capture(Some(raw_capture("pier")), "pier").await.unwrap();
    assert!(receipt.sync_requested);
    tokio::time::timeout(Duration::from_secs(5), harness.client.wait_for_sync_complete())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(harness.transport.sent_captions(), vec!["pier"]);
    assert!(harness.store.get(receipt.id).unwrap().is_none());
    assert!(harness.sink.names().contains(&"capture_stored"));
    harness.coordinator.shutdown().await;
}

#[tokio::test]
async fn offline_capture_is_kept_without_sync_request() {
    let mut harness = harness(false).await;

    let receipt = harness.client.capture(Some(raw_capture("tunnel")), "tunnel").await.unwrap();

    assert!(!receipt.sync_requested);
    let pending = harness.client.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, receipt.id);
    assert!(!pending[0].synced);
    harness.coordinator.shutdown().await;
    assert!(harness.transport.sent().is_empty());
}

#[tokio::test]
async fn rejected_captures_leave_the_queue_untouched() {
    let mut harness = harness(true).await;

    assert_eq!(
        harness.client.capture(None, "nothing").await,
        Err(CaptureError::MissingCapture)
    );
    assert_eq!(
        harness.client.capture(Some(raw_capture("blank")), "   ").await,
        Err(CaptureError::Codec(CodecError::EmptyCaption))
    );

    assert!(harness.store.list_all().unwrap().is_empty());
    assert!(!harness.sink.names().contains(&"capture_stored"));
    harness.coordinator.shutdown().await;
}

#[tokio::test]
async fn failed_delivery_keeps_capture_pending() {
    let mut harness = harness(true).await;
    harness.transport.reply("storm", Reply::Fail);

    let receipt = harness.client.capture(Some(raw_capture("storm")), "storm").await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), harness.client.wait_for_sync_complete())
        .await
        .unwrap()
        .unwrap();

    let pending = harness.client.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, receipt.id);
    harness.coordinator.shutdown().await;
}

#[tokio::test]
async fn capture_waits_for_a_pass_started_after_it() {
    let mut harness = harness(true).await;
    harness.transport.reply("queued-late", Reply::Hang);
    harness.coordinator.request_pass(SyncTrigger::Manual).await.unwrap();

    harness.client.capture(Some(raw_capture("queued-late")), "queued-late").await.unwrap();
    let early =
        tokio::time::timeout(Duration::from_millis(50), harness.client.wait_for_sync_complete()).await;
    assert!(early.is_err(), "stale completion satisfied the wait");

    tokio::time::timeout(Duration::from_secs(5), harness.client.wait_for_sync_complete())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(harness.transport.sent_captions(), vec!["queued-late"]);
    assert_eq!(harness.client.pending().await.unwrap().len(), 1);
    harness.coordinator.shutdown().await;
}

// ============================================================================
// SECTION: Gallery
// ============================================================================

#[tokio::test]
async fn gallery_lists_pending_before_remote() {
    let mut harness = harness(false).await;
    harness.client.capture(Some(raw_capture("local")), "local").await.unwrap();
    let catalog = StaticCatalog {
        result: Ok(vec![remote_item(1, "remote")]),
    };

    let entries = harness.client.gallery(&catalog).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].caption, "local");
    assert_eq!(entries[0].state, EntryState::Pending);
    assert_eq!(entries[1].caption, "remote");
    assert_eq!(entries[1].state, EntryState::Confirmed);
    harness.coordinator.shutdown().await;
}

#[tokio::test]
async fn gallery_falls_back_to_local_entries() {
    let mut harness = harness(false).await;
    harness.client.capture(Some(raw_capture("local")), "local").await.unwrap();
    let catalog = StaticCatalog {
        result: Err(CatalogFetchError::Status(502)),
    };

    let entries = harness.client.gallery(&catalog).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].state, EntryState::Pending);
    assert!(harness.sink.names().contains(&"catalog_unavailable"));
    harness.coordinator.shutdown().await;
}
