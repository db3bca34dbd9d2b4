// crates/snapqueue-core/src/core/time.rs
// ============================================================================
// Module: Snapqueue Time Model
// Description: Creation timestamps for queued records.
// Purpose: Provide a stable ordering key that survives process restarts.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Records carry the unix-epoch millisecond at which they were created. The
//! value is the secondary ordering key of the queue and is never mutated.
//! Stores stamp records at insert with [`Timestamp::now`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Creation timestamp in unix epoch milliseconds.
///
/// # Invariants
/// - No validation is performed; monotonicity is a store responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current wall-clock time, saturating outside the `i64` range.
    #[must_use]
    pub fn now() -> Self {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        Self(i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX))
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Renders the timestamp as an RFC 3339 string (UTC).
    ///
    /// Returns `None` when the value is outside the representable range.
    #[must_use]
    pub fn to_rfc3339(self) -> Option<String> {
        let nanos = i128::from(self.0).checked_mul(1_000_000)?;
        let datetime = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
        datetime.format(&Rfc3339).ok()
    }
}
