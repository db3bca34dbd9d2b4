// crates/snapqueue-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Queue Store
// Description: Durable QueueStore backend using SQLite WAL.
// Purpose: Keep pending captures safe across crashes and restarts.
// Dependencies: snapqueue-core, rusqlite, sha2
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`QueueStore`](snapqueue_core::QueueStore)
//! with a versioned schema, in-place migration, and per-record payload hashes
//! that are verified on every read. [`SqliteQueueStorePool`] opens the store
//! lazily and shares one handle between the foreground and the sync worker.
//! Security posture: database contents are untrusted and fail closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_PAYLOAD_BYTES;
pub use store::SCHEMA_VERSION;
pub use store::SqliteQueueStore;
pub use store::SqliteQueueStorePool;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
