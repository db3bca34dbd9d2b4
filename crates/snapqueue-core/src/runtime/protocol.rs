// crates/snapqueue-core/src/runtime/protocol.rs
// ============================================================================
// Module: Snapqueue Sync Protocol
// Description: Versioned messages exchanged between foreground and sync worker.
// Purpose: Fix the wire schema of manual-sync requests and pass notifications.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Foreground and worker never share in-memory state. They exchange
//! [`ProtocolEnvelope`] values carrying a version, a fixed type tag, and an
//! optional payload. Neither message defined today carries a payload; the
//! field exists so the schema can grow without a version bump.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Current protocol version.
pub const PROTOCOL_VERSION: u32 = 1;
/// Wire tag of the manual sync request.
pub const SYNC_NOW_TAG: &str = "SYNC_NOW";
/// Wire tag of the pass-complete notification.
pub const SYNC_COMPLETE_TAG: &str = "SYNC_COMPLETE";

// ============================================================================
// SECTION: Messages
// ============================================================================

/// Message kinds understood by both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncMessage {
    /// Foreground asks the worker to run a pass now.
    SyncNow,
    /// Worker reports that a pass finished.
    SyncComplete,
}

impl SyncMessage {
    /// Returns the wire tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::SyncNow => SYNC_NOW_TAG,
            Self::SyncComplete => SYNC_COMPLETE_TAG,
        }
    }

    /// Parses a wire tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            SYNC_NOW_TAG => Some(Self::SyncNow),
            SYNC_COMPLETE_TAG => Some(Self::SyncComplete),
            _ => None,
        }
    }

    /// Wraps the message in an envelope at the current protocol version.
    #[must_use]
    pub const fn envelope(self) -> ProtocolEnvelope {
        ProtocolEnvelope {
            version: PROTOCOL_VERSION,
            message: self,
            payload: None,
        }
    }
}

/// Versioned protocol envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolEnvelope {
    /// Protocol version.
    pub version: u32,
    /// Message kind.
    pub message: SyncMessage,
    /// Optional payload; unused by current messages.
    pub payload: Option<Value>,
}

/// Serialized envelope shape.
#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    version: u32,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Protocol decoding errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Message is not a well-formed envelope.
    #[error("malformed protocol message: {0}")]
    Malformed(String),
    /// Envelope version is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u32),
    /// Type tag is not recognized.
    #[error("unknown message type: {0}")]
    UnknownType(String),
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Serializes an envelope to its JSON wire form.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] when serialization fails.
pub fn encode(envelope: &ProtocolEnvelope) -> Result<String, ProtocolError> {
    let wire = WireEnvelope {
        version: envelope.version,
        kind: envelope.message.tag().to_string(),
        payload: envelope.payload.clone(),
    };
    serde_json::to_string(&wire).map_err(|err| ProtocolError::Malformed(err.to_string()))
}

/// Parses an envelope from its JSON wire form.
///
/// # Errors
///
/// Returns [`ProtocolError`] for malformed JSON, unknown versions, or unknown tags.
pub fn decode(raw: &str) -> Result<ProtocolEnvelope, ProtocolError> {
    let wire: WireEnvelope =
        serde_json::from_str(raw).map_err(|err| ProtocolError::Malformed(err.to_string()))?;
    if wire.version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(wire.version));
    }
    let message = SyncMessage::from_tag(&wire.kind).ok_or(ProtocolError::UnknownType(wire.kind))?;
    Ok(ProtocolEnvelope {
        version: wire.version,
        message,
        payload: wire.payload,
    })
}
