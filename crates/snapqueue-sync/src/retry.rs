// crates/snapqueue-sync/src/retry.rs
// ============================================================================
// Module: Snapqueue Retry Policy
// Description: Timing policy for sync passes.
// Purpose: Centralize pacing, request timeout, and periodic trigger interval.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Failed records are never retried within a pass; they stay queued and are
//! attempted again by the next pass. The policy only controls pacing.

use std::time::Duration;

/// Default delay between two delivery attempts in one pass.
pub const DEFAULT_INTER_RECORD_DELAY: Duration = Duration::from_secs(1);
/// Default timeout for a single delivery request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default interval of the periodic trigger.
pub const DEFAULT_PERIODIC_INTERVAL: Duration = Duration::from_secs(30);

/// Pacing and timeout policy for sync passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay inserted between consecutive delivery attempts.
    pub inter_record_delay: Duration,
    /// Upper bound on one delivery request; expiry counts as a transport failure.
    pub request_timeout: Duration,
    /// Interval between periodic passes.
    pub periodic_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            inter_record_delay: DEFAULT_INTER_RECORD_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            periodic_interval: DEFAULT_PERIODIC_INTERVAL,
        }
    }
}
