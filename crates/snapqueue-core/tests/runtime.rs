// crates/snapqueue-core/tests/runtime.rs
// ============================================================================
// Module: Core Runtime Tests
// Description: Validate protocol, catalog, gallery, and in-memory store behavior.
// Purpose: Ensure pure runtime logic matches the queue contract.
// Dependencies: snapqueue-core, proptest
// ============================================================================

//! ## Overview
//! Exercises the versioned protocol envelope, catalog parsing of untrusted
//! responses, gallery merge ordering, and the in-memory store contract.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use proptest::prelude::*;
use snapqueue_core::CatalogError;
use snapqueue_core::EntrySource;
use snapqueue_core::EntryState;
use snapqueue_core::InMemoryQueueStore;
use snapqueue_core::PROTOCOL_VERSION;
use snapqueue_core::ProtocolError;
use snapqueue_core::QueueStore;
use snapqueue_core::RawCapture;
use snapqueue_core::RecordId;
use snapqueue_core::RemoteId;
use snapqueue_core::SharedQueueStore;
use snapqueue_core::QueueStoreProvider;
use snapqueue_core::SyncMessage;
use snapqueue_core::Timestamp;
use snapqueue_core::parse_catalog;
use snapqueue_core::runtime::codec;
use snapqueue_core::runtime::gallery;
use snapqueue_core::runtime::protocol;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn capture(caption: &str) -> snapqueue_core::NewRecord {
    let raw = RawCapture {
        bytes: caption.as_bytes().to_vec(),
        filename: format!("{caption}.jpg"),
        mime_type: Some("image/jpeg".to_string()),
    };
    codec::encode(&raw, caption).unwrap()
}

// ============================================================================
// SECTION: Protocol
// ============================================================================

#[test]
fn protocol_envelope_uses_fixed_type_tags() {
    let wire = protocol::encode(&SyncMessage::SyncComplete.envelope()).unwrap();
    assert_eq!(wire, r#"{"version":1,"type":"SYNC_COMPLETE"}"#);
    let decoded = protocol::decode(r#"{"version":1,"type":"SYNC_NOW"}"#).unwrap();
    assert_eq!(decoded.message, SyncMessage::SyncNow);
    assert_eq!(decoded.version, PROTOCOL_VERSION);
    assert!(decoded.payload.is_none());
}

#[test]
fn protocol_rejects_unknown_versions_and_tags() {
    assert_eq!(
        protocol::decode(r#"{"version":2,"type":"SYNC_NOW"}"#),
        Err(ProtocolError::UnsupportedVersion(2))
    );
    assert_eq!(
        protocol::decode(r#"{"version":1,"type":"SYNC_LATER"}"#),
        Err(ProtocolError::UnknownType("SYNC_LATER".to_string()))
    );
    assert!(matches!(protocol::decode("{"), Err(ProtocolError::Malformed(_))));
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

#[test]
fn catalog_parses_nested_image_list() {
    let body = br#"{"code":"success","result":{"data":{"images":[
        {"id":3,"image_url":"https://cdn.example/3.jpg","caption":"harbor"},
        {"id":"abc","image_url":"https://cdn.example/abc.jpg"}
    ]}}}"#;
    let items = parse_catalog(body).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, RemoteId::Number(3));
    assert_eq!(items[0].caption, "harbor");
    assert_eq!(items[1].id, RemoteId::Text("abc".to_string()));
    assert_eq!(items[1].caption, "");
}

#[test]
fn catalog_without_images_is_empty_and_failure_is_reported() {
    assert!(parse_catalog(br#"{"code":"success"}"#).unwrap().is_empty());
    assert_eq!(
        parse_catalog(br#"{"code":"error","message":"nope"}"#),
        Err(CatalogError::NotSuccessful("error".to_string()))
    );
    assert!(matches!(parse_catalog(b"not json"), Err(CatalogError::Malformed(_))));
}

// ============================================================================
// SECTION: Gallery
// ============================================================================

#[test]
fn gallery_lists_pending_local_before_confirmed_remote() {
    let store = InMemoryQueueStore::new();
    store.insert(capture("first")).unwrap();
    store.insert(capture("second")).unwrap();
    let local = store.list_all().unwrap();
    let remote = parse_catalog(
        br#"{"code":"success","result":{"data":{"images":[{"id":9,"image_url":"u","caption":"old"}]}}}"#,
    )
    .unwrap();

    let entries = gallery::merge(&local, &remote);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].caption, "first");
    assert_eq!(entries[0].state, EntryState::Pending);
    assert!(entries[0].image.starts_with("data:image/jpeg;base64,"));
    assert_eq!(entries[1].caption, "second");
    assert_eq!(entries[2].source, EntrySource::Remote(RemoteId::Number(9)));
    assert_eq!(entries[2].state, EntryState::Confirmed);
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

#[test]
fn memory_store_stamps_records_with_current_time() {
    let store = InMemoryQueueStore::new();
    let before = Timestamp::now();
    let id = store.insert(capture("stamped")).unwrap();
    let after = Timestamp::now();

    let created_at = store.get(id).unwrap().unwrap().created_at;
    assert!(before <= created_at && created_at <= after);
    assert!(created_at.to_rfc3339().unwrap().ends_with('Z'));
}

#[test]
fn memory_store_insert_list_remove() {
    let store = InMemoryQueueStore::new();
    let a = store.insert(capture("a")).unwrap();
    let b = store.insert(capture("b")).unwrap();
    assert!(b > a);

    let records = store.list_all().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|record| !record.synced));
    assert_eq!(store.get(a).unwrap().unwrap().caption.as_str(), "a");

    store.remove(a).unwrap();
    store.remove(a).unwrap();
    store.remove(RecordId::from_raw(999).unwrap()).unwrap();
    let remaining = store.list_all().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, b);
}

#[test]
fn shared_store_provider_hands_out_same_store() {
    let shared = SharedQueueStore::from_store(InMemoryQueueStore::new());
    let handle = shared.acquire().unwrap();
    let id = handle.insert(capture("x")).unwrap();
    assert!(shared.get(id).unwrap().is_some());
}

proptest! {
    #[test]
    fn memory_store_ids_are_never_reused(ops in proptest::collection::vec(any::<bool>(), 1 .. 40)) {
        let store = InMemoryQueueStore::new();
        let mut last: Option<RecordId> = None;
        for insert in ops {
            if insert {
                let id = store.insert(capture("p")).unwrap();
                if let Some(previous) = last {
                    prop_assert!(id > previous);
                }
                last = Some(id);
            } else if let Some(first) = store.list_all().unwrap().first() {
                store.remove(first.id).unwrap();
            }
        }
    }
}
