// crates/snapqueue-sync/src/events.rs
// ============================================================================
// Module: Snapqueue Sync Events
// Description: Structured events for sync passes and capture handling.
// Purpose: Emit JSON-line logs without hard dependencies on a logging stack.
// Dependencies: serde, serde_json, snapqueue-core
// ============================================================================

//! ## Overview
//! Every trigger, pass boundary, and per-record outcome is reported as a
//! [`SyncEvent`] to a [`SyncEventSink`]. Events carry identifiers and outcome
//! labels only; payload bytes are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use snapqueue_core::DeliveryOutcome;
use snapqueue_core::RecordId;

use crate::worker::PassReport;
use crate::worker::SyncTrigger;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Sync event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Pass identifier when the event belongs to a pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_id: Option<u64>,
    /// Trigger that started the pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<SyncTrigger>,
    /// Record identifier for per-record events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    /// Outcome label for per-record events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    /// HTTP status when a response was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Human-readable detail (error message or observed marker).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Pass summary for completion events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PassReport>,
}

impl SyncEvent {
    /// Creates an event with only the name and timestamp set.
    fn named(event: &'static str) -> Self {
        Self {
            event,
            timestamp_ms: now_millis(),
            pass_id: None,
            trigger: None,
            record_id: None,
            outcome: None,
            status: None,
            detail: None,
            report: None,
        }
    }

    /// A pass was triggered and is about to snapshot the queue.
    #[must_use]
    pub fn pass_started(pass_id: u64, trigger: SyncTrigger) -> Self {
        Self {
            pass_id: Some(pass_id),
            trigger: Some(trigger),
            ..Self::named("sync_pass_started")
        }
    }

    /// A pass was aborted before attempting any record.
    #[must_use]
    pub fn pass_aborted(pass_id: u64, trigger: SyncTrigger, reason: &str) -> Self {
        Self {
            pass_id: Some(pass_id),
            trigger: Some(trigger),
            detail: Some(reason.to_string()),
            ..Self::named("sync_pass_aborted")
        }
    }

    /// A pass exhausted its snapshot.
    #[must_use]
    pub fn pass_completed(report: &PassReport) -> Self {
        Self {
            pass_id: Some(report.pass_id),
            trigger: Some(report.trigger),
            report: Some(report.clone()),
            ..Self::named("sync_pass_completed")
        }
    }

    /// A delivery attempt finished with the given outcome.
    #[must_use]
    pub fn record_outcome(pass_id: u64, record_id: RecordId, outcome: &DeliveryOutcome) -> Self {
        let (status, detail) = match outcome {
            DeliveryOutcome::Confirmed => (None, None),
            DeliveryOutcome::TransportFailure {
                reason,
            }
            | DeliveryOutcome::DecodeFailure {
                reason,
            } => (None, Some(reason.clone())),
            DeliveryOutcome::ServerRejected {
                status,
                marker,
            } => (Some(*status), marker.clone()),
        };
        Self {
            pass_id: Some(pass_id),
            record_id: Some(record_id),
            outcome: Some(outcome.label()),
            status,
            detail,
            ..Self::named("sync_record_attempted")
        }
    }

    /// A record was skipped because another pass is delivering it.
    #[must_use]
    pub fn record_in_flight(pass_id: u64, record_id: RecordId) -> Self {
        Self {
            pass_id: Some(pass_id),
            record_id: Some(record_id),
            outcome: Some("skipped_in_flight"),
            ..Self::named("sync_record_skipped")
        }
    }

    /// A record already marked synced was skipped.
    #[must_use]
    pub fn record_already_synced(pass_id: u64, record_id: RecordId) -> Self {
        Self {
            pass_id: Some(pass_id),
            record_id: Some(record_id),
            outcome: Some("skipped_synced"),
            ..Self::named("sync_record_skipped")
        }
    }

    /// A record was skipped because an overlapping pass already removed it.
    #[must_use]
    pub fn record_already_removed(pass_id: u64, record_id: RecordId) -> Self {
        Self {
            pass_id: Some(pass_id),
            record_id: Some(record_id),
            outcome: Some("skipped_removed"),
            ..Self::named("sync_record_skipped")
        }
    }

    /// A confirmed record could not be removed and will be resent.
    #[must_use]
    pub fn remove_failed(pass_id: u64, record_id: RecordId, reason: &str) -> Self {
        Self {
            pass_id: Some(pass_id),
            record_id: Some(record_id),
            detail: Some(reason.to_string()),
            ..Self::named("sync_remove_failed")
        }
    }

    /// A periodic tick was skipped while offline.
    #[must_use]
    pub fn periodic_skipped_offline() -> Self {
        Self {
            trigger: Some(SyncTrigger::Periodic),
            ..Self::named("sync_periodic_skipped_offline")
        }
    }

    /// A foreground message could not be decoded.
    #[must_use]
    pub fn message_rejected(reason: &str) -> Self {
        Self {
            detail: Some(reason.to_string()),
            ..Self::named("sync_message_rejected")
        }
    }

    /// The capture flow stored a new record.
    #[must_use]
    pub fn capture_stored(record_id: RecordId, sync_requested: bool) -> Self {
        Self {
            record_id: Some(record_id),
            outcome: Some(if sync_requested { "sync_requested" } else { "queued_offline" }),
            ..Self::named("capture_stored")
        }
    }

    /// The remote catalog could not be fetched for the gallery.
    #[must_use]
    pub fn catalog_unavailable(reason: &str) -> Self {
        Self {
            detail: Some(reason.to_string()),
            ..Self::named("catalog_unavailable")
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Sync event sink.
pub trait SyncEventSink: Send + Sync {
    /// Record a sync event.
    fn record(&self, event: &SyncEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrSyncEventSink;

impl SyncEventSink for StderrSyncEventSink {
    fn record(&self, event: &SyncEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that logs JSON lines to a file.
pub struct FileSyncEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileSyncEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl SyncEventSink for FileSyncEventSink {
    fn record(&self, event: &SyncEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopSyncEventSink;

impl SyncEventSink for NoopSyncEventSink {
    fn record(&self, _event: &SyncEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current unix epoch in milliseconds.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|duration| duration.as_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;

    #[test]
    fn file_sink_appends_json_lines() {
        let temp = std::env::temp_dir().join(format!("snapqueue-events-{}.log", std::process::id()));
        let _ = std::fs::remove_file(&temp);
        let sink = FileSyncEventSink::new(&temp).unwrap();
        sink.record(&SyncEvent::pass_started(1, SyncTrigger::Manual));
        sink.record(&SyncEvent::record_outcome(
            1,
            RecordId::from_raw(3).unwrap(),
            &DeliveryOutcome::ServerRejected {
                status: 500,
                marker: None,
            },
        ));
        let content = std::fs::read_to_string(&temp).unwrap();
        let lines: Vec<serde_json::Value> =
            content.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "sync_pass_started");
        assert_eq!(lines[0]["trigger"], "manual");
        assert_eq!(lines[1]["outcome"], "server_rejected");
        assert_eq!(lines[1]["status"], 500);
        assert_eq!(lines[1]["record_id"], 3);
        let _ = std::fs::remove_file(&temp);
    }
}
