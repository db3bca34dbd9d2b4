// crates/snapqueue-core/src/core/record.rs
// ============================================================================
// Module: Snapqueue Records
// Description: Queue record model for pending capture uploads.
// Purpose: Define the stable shape of records persisted by queue stores.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`QueueRecord`] is a single pending upload. Records are append-only: they
//! are created by the capture flow, read by any number of sync passes, and
//! deleted exactly once after the remote endpoint confirms delivery.
//! Invariants:
//! - A record exists in a store iff it has not been confirmed delivered.
//! - Records are immutable after creation; there is no update-in-place.
//! - `synced` is `false` from creation and is only observed as `false`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RecordId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Caption
// ============================================================================

/// User-supplied caption attached to a capture.
///
/// # Invariants
/// - Never empty and never surrounded by whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Caption(String);

impl Caption {
    /// Creates a caption from raw user input, trimming surrounding whitespace.
    ///
    /// Returns `None` when the trimmed input is empty.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Returns the caption text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Caption {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| "caption must not be empty".to_string())
    }
}

impl From<Caption> for String {
    fn from(value: Caption) -> Self {
        value.0
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Record contents supplied to a store insert (everything except store-assigned fields).
///
/// # Invariants
/// - `payload` is a self-contained encoding with no external file references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    /// Encoded image content (data URL).
    pub payload: String,
    /// User-supplied caption.
    pub caption: Caption,
    /// Original file name (informational).
    pub filename: String,
    /// Raw image size in bytes (informational).
    pub size_bytes: u64,
    /// Declared MIME type (informational).
    pub mime_type: String,
}

/// A pending upload persisted in a queue store.
///
/// # Invariants
/// - `id` is stable for the record's lifetime and never reused by the store.
/// - `created_at` is assigned at insert and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    /// Store-assigned record identifier.
    pub id: RecordId,
    /// Encoded image content (data URL).
    pub payload: String,
    /// User-supplied caption.
    pub caption: Caption,
    /// Original file name (informational).
    pub filename: String,
    /// Raw image size in bytes (informational).
    pub size_bytes: u64,
    /// Declared MIME type (informational).
    pub mime_type: String,
    /// Creation timestamp used for ordering.
    pub created_at: Timestamp,
    /// Delivery flag; always `false` while the record exists.
    pub synced: bool,
}

impl QueueRecord {
    /// Builds a stored record from insert contents and store-assigned fields.
    #[must_use]
    pub fn from_new(id: RecordId, created_at: Timestamp, record: NewRecord) -> Self {
        Self {
            id,
            payload: record.payload,
            caption: record.caption,
            filename: record.filename,
            size_bytes: record.size_bytes,
            mime_type: record.mime_type,
            created_at,
            synced: false,
        }
    }

    /// Returns the record summary without the payload, suitable for logs and listings.
    #[must_use]
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id,
            caption: self.caption.as_str().to_string(),
            filename: self.filename.clone(),
            size_bytes: self.size_bytes,
            mime_type: self.mime_type.clone(),
            created_at: self.created_at,
            synced: self.synced,
        }
    }
}

/// Payload-free view of a queued record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
    /// Record identifier.
    pub id: RecordId,
    /// Caption text.
    pub caption: String,
    /// Original file name.
    pub filename: String,
    /// Raw image size in bytes.
    pub size_bytes: u64,
    /// Declared MIME type.
    pub mime_type: String,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Delivery flag.
    pub synced: bool,
}
