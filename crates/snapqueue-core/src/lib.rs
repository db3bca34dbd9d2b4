// crates/snapqueue-core/src/lib.rs
// ============================================================================
// Module: Snapqueue Core
// Description: Data model, codec, and storage contracts for offline capture queues.
// Purpose: Share pure logic between the durable store, sync worker, and foreground.
// Dependencies: base64, serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Snapqueue keeps captured images in a durable local queue until a remote
//! endpoint confirms delivery. This crate holds everything that is independent
//! of storage engines and transports: the record model, the record codec, the
//! versioned foreground/worker protocol, response classification, catalog
//! parsing, and the [`QueueStore`] contract with an in-memory implementation.
//! Security posture: endpoint responses and catalog items are untrusted input
//! and are classified fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::Caption;
pub use crate::core::CatalogItem;
pub use crate::core::EntrySource;
pub use crate::core::EntryState;
pub use crate::core::GalleryEntry;
pub use crate::core::NewRecord;
pub use crate::core::QueueRecord;
pub use crate::core::RecordId;
pub use crate::core::RecordSummary;
pub use crate::core::RemoteId;
pub use crate::core::Timestamp;
pub use crate::interfaces::QueueStore;
pub use crate::interfaces::QueueStoreProvider;
pub use crate::interfaces::SharedQueueStore;
pub use crate::interfaces::StoreError;
pub use crate::runtime::CatalogError;
pub use crate::runtime::CodecError;
pub use crate::runtime::DecodedPayload;
pub use crate::runtime::DeliveryForm;
pub use crate::runtime::DeliveryOutcome;
pub use crate::runtime::InMemoryQueueStore;
pub use crate::runtime::MAX_CAPTURE_BYTES;
pub use crate::runtime::PROTOCOL_VERSION;
pub use crate::runtime::ProtocolEnvelope;
pub use crate::runtime::ProtocolError;
pub use crate::runtime::RawCapture;
pub use crate::runtime::SyncMessage;
pub use crate::runtime::classify_response;
pub use crate::runtime::parse_catalog;
