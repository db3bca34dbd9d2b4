// crates/snapqueue-core/src/runtime/store.rs
// ============================================================================
// Module: Snapqueue In-Memory Store
// Description: Process-local queue store for tests and embedding.
// Purpose: Provide QueueStore semantics without a database.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryQueueStore`] mirrors the durable store contract: identifiers are
//! monotonically increasing and never reused, listings are ordered by creation
//! time, and removal of an absent identifier is a no-op. Nothing survives the
//! process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::NewRecord;
use crate::core::QueueRecord;
use crate::core::RecordId;
use crate::core::Timestamp;
use crate::interfaces::QueueStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable store state.
#[derive(Debug, Default)]
struct MemoryState {
    /// Last assigned identifier.
    last_id: u64,
    /// Stored records keyed by identifier.
    records: BTreeMap<RecordId, QueueRecord>,
}

/// In-memory queue store.
#[derive(Debug, Default)]
pub struct InMemoryQueueStore {
    /// Guarded store state.
    state: Mutex<MemoryState>,
}

impl InMemoryQueueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the store state.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Io("in-memory store lock poisoned".to_string()))
    }
}

impl QueueStore for InMemoryQueueStore {
    fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError> {
        let mut state = self.lock()?;
        let next = state
            .last_id
            .checked_add(1)
            .and_then(RecordId::from_raw)
            .ok_or_else(|| StoreError::Io("record id space exhausted".to_string()))?;
        state.last_id = next.get();
        let created_at = Timestamp::now();
        state.records.insert(next, QueueRecord::from_new(next, created_at, record));
        drop(state);
        Ok(next)
    }

    fn list_all(&self) -> Result<Vec<QueueRecord>, StoreError> {
        let mut records: Vec<QueueRecord> = self.lock()?.records.values().cloned().collect();
        records.sort_by_key(|record| (record.created_at, record.id));
        Ok(records)
    }

    fn remove(&self, id: RecordId) -> Result<(), StoreError> {
        self.lock()?.records.remove(&id);
        Ok(())
    }

    fn get(&self, id: RecordId) -> Result<Option<QueueRecord>, StoreError> {
        Ok(self.lock()?.records.get(&id).cloned())
    }
}
