// crates/snapqueue-core/src/runtime/delivery.rs
// ============================================================================
// Module: Snapqueue Delivery Classification
// Description: Classification of upload endpoint responses.
// Purpose: Decide whether a delivery attempt confirmed the record.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A record is removed from the queue only when the endpoint answers with a
//! 2xx status and a JSON body whose `code` field equals `"success"`. Every
//! other combination leaves the record pending. Classification is fail-closed:
//! ambiguous responses are never treated as confirmations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON field carrying the success marker.
pub const SUCCESS_FIELD: &str = "code";
/// Literal success marker value.
pub const SUCCESS_MARKER: &str = "success";

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of one delivery attempt.
///
/// # Invariants
/// - Only [`DeliveryOutcome::Confirmed`] permits removing the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    /// Endpoint confirmed the upload.
    Confirmed,
    /// No response was received (connect error, timeout, body read failure).
    TransportFailure {
        /// Failure description.
        reason: String,
    },
    /// Endpoint answered but did not confirm.
    ServerRejected {
        /// HTTP status code.
        status: u16,
        /// Marker observed in the body, if any.
        marker: Option<String>,
    },
    /// Endpoint answered 2xx with a body that is not JSON.
    DecodeFailure {
        /// Parse failure description.
        reason: String,
    },
}

impl DeliveryOutcome {
    /// Returns true when the record may be removed from the queue.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Returns a stable label for logging.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::TransportFailure {
                ..
            } => "transport_failure",
            Self::ServerRejected {
                ..
            } => "server_rejected",
            Self::DecodeFailure {
                ..
            } => "decode_failure",
        }
    }
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies an endpoint response by status code and raw body.
#[must_use]
pub fn classify_response(status: u16, body: &[u8]) -> DeliveryOutcome {
    if !(200 ..= 299).contains(&status) {
        let marker = serde_json::from_slice::<Value>(body).ok().and_then(|value| marker_of(&value));
        return DeliveryOutcome::ServerRejected {
            status,
            marker,
        };
    }
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            return DeliveryOutcome::DecodeFailure {
                reason: err.to_string(),
            };
        }
    };
    match marker_of(&value) {
        Some(marker) if marker == SUCCESS_MARKER => DeliveryOutcome::Confirmed,
        marker => DeliveryOutcome::ServerRejected {
            status,
            marker,
        },
    }
}

/// Extracts the string success marker from a JSON body.
fn marker_of(value: &Value) -> Option<String> {
    value.get(SUCCESS_FIELD).and_then(Value::as_str).map(ToString::to_string)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
