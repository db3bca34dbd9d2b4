// crates/snapqueue-core/src/core/identifiers.rs
// ============================================================================
// Module: Snapqueue Identifiers
// Description: Opaque identifiers for queued capture records.
// Purpose: Provide strongly typed, serializable record identifiers.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Record identifiers are assigned by the queue store and are never reused
//! within a store's lifetime. They serialize as plain numbers on the wire and
//! enforce the non-zero, 1-based invariant at construction boundaries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Identifier of a queued record.
///
/// # Invariants
/// - Always >= 1 (non-zero, 1-based).
/// - Assigned by the store; callers never mint identifiers for new records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(NonZeroU64);

impl RecordId {
    /// Creates a record identifier from a non-zero value.
    #[must_use]
    pub const fn new(id: NonZeroU64) -> Self {
        Self(id)
    }

    /// Creates a record identifier from a raw value (returns `None` if zero).
    #[must_use]
    pub const fn from_raw(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Creates a record identifier from a signed database rowid.
    ///
    /// Returns `None` for zero or negative values.
    #[must_use]
    pub fn from_rowid(rowid: i64) -> Option<Self> {
        u64::try_from(rowid).ok().and_then(Self::from_raw)
    }

    /// Returns the raw identifier value (always >= 1).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.get().fmt(f)
    }
}
