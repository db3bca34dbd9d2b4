// crates/snapqueue-core/src/interfaces/mod.rs
// ============================================================================
// Module: Snapqueue Interfaces
// Description: Backend-agnostic interfaces for durable queue storage.
// Purpose: Define the contract surfaces shared by the foreground and sync worker.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The queue store is the only shared mutable resource between the capture
//! flow and the sync worker. Every operation is atomic with respect to a single
//! record. Implementations must be durable before returning and must never
//! report success for an operation that did not commit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::NewRecord;
use crate::core::QueueRecord;
use crate::core::RecordId;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Queue store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Any error leaves a record's pending status unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backing store could not be opened.
    #[error("queue store unavailable: {0}")]
    Unavailable(String),
    /// A single store operation failed to commit.
    #[error("queue store io error: {0}")]
    Io(String),
    /// Stored data failed integrity checks.
    #[error("queue store corruption: {0}")]
    Corrupt(String),
    /// Stored schema version is incompatible.
    #[error("queue store version mismatch: {0}")]
    VersionMismatch(String),
    /// Input or stored data is invalid.
    #[error("queue store invalid data: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Queue Store
// ============================================================================

/// Durable queue of pending uploads.
pub trait QueueStore: Send + Sync {
    /// Persists a new record with `synced = false` and returns its fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be durably committed.
    fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError>;

    /// Returns every stored record, oldest first by creation time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the listing cannot be read.
    fn list_all(&self) -> Result<Vec<QueueRecord>, StoreError>;

    /// Deletes the record if present; absent identifiers are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the deletion cannot be committed.
    fn remove(&self, id: RecordId) -> Result<(), StoreError>;

    /// Loads a single record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be read.
    fn get(&self, id: RecordId) -> Result<Option<QueueRecord>, StoreError>;

    /// Reports store readiness.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Reference-counted queue store handle shared across execution contexts.
#[derive(Clone)]
pub struct SharedQueueStore {
    /// Shared store implementation.
    inner: Arc<dyn QueueStore>,
}

impl SharedQueueStore {
    /// Wraps a store implementation in a shared handle.
    #[must_use]
    pub fn from_store(store: impl QueueStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl QueueStore for SharedQueueStore {
    fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError> {
        self.inner.insert(record)
    }

    fn list_all(&self) -> Result<Vec<QueueRecord>, StoreError> {
        self.inner.list_all()
    }

    fn remove(&self, id: RecordId) -> Result<(), StoreError> {
        self.inner.remove(id)
    }

    fn get(&self, id: RecordId) -> Result<Option<QueueRecord>, StoreError> {
        self.inner.get(id)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.inner.readiness()
    }
}

// ============================================================================
// SECTION: Store Provider
// ============================================================================

/// Scoped acquisition of a queue store handle.
///
/// Providers open the backing store lazily and hand out shared handles so that
/// concurrent passes never race on schema creation. A failed open surfaces
/// [`StoreError::Unavailable`] and is retried on the next acquisition.
pub trait QueueStoreProvider: Send + Sync {
    /// Acquires a shared store handle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backing store cannot be opened.
    fn acquire(&self) -> Result<SharedQueueStore, StoreError>;
}

impl QueueStoreProvider for SharedQueueStore {
    fn acquire(&self) -> Result<SharedQueueStore, StoreError> {
        Ok(self.clone())
    }
}
