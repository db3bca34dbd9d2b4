// crates/snapqueue-core/src/core/mod.rs
// ============================================================================
// Module: Snapqueue Core Types
// Description: Data model for queued captures and remote catalog entries.
// Purpose: Group identifier, time, record, and catalog types.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Core types are plain data: they never touch the network or a store.

pub mod catalog;
pub mod identifiers;
pub mod record;
pub mod time;

pub use catalog::CatalogItem;
pub use catalog::EntrySource;
pub use catalog::EntryState;
pub use catalog::GalleryEntry;
pub use catalog::RemoteId;
pub use identifiers::RecordId;
pub use record::Caption;
pub use record::NewRecord;
pub use record::QueueRecord;
pub use record::RecordSummary;
pub use time::Timestamp;
