// crates/snapqueue-core/src/runtime/codec.rs
// ============================================================================
// Module: Snapqueue Record Codec
// Description: Conversion between raw captures, stored records, and delivery forms.
// Purpose: Define the stable on-disk payload shape for queued captures.
// Dependencies: base64, thiserror
// ============================================================================

//! ## Overview
//! The codec turns a raw capture plus caption into [`NewRecord`] fields and a
//! stored [`QueueRecord`] into the [`DeliveryForm`] sent to the upload
//! endpoint. Payloads are self-contained data URLs
//! (`data:<mime>;base64,<bytes>`) so a record stays valid after a restart.
//! The codec is pure: it never touches the network or a store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::core::Caption;
use crate::core::NewRecord;
use crate::core::QueueRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum raw capture size accepted by the codec.
pub const MAX_CAPTURE_BYTES: usize = 25 * 1024 * 1024;
/// MIME type used when a capture does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
/// File name used when a capture does not carry one.
pub const DEFAULT_FILENAME: &str = "capture";
/// Delivery form field carrying the encoded payload.
pub const FORM_FIELD_IMAGE_DATA: &str = "image_data";
/// Delivery form field carrying the caption.
pub const FORM_FIELD_CAPTION: &str = "caption";
/// Data URL scheme prefix.
const DATA_URL_PREFIX: &str = "data:";
/// Data URL base64 marker.
const BASE64_MARKER: &str = ";base64";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Codec errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages never embed payload bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Caption is empty after trimming.
    #[error("caption must not be empty")]
    EmptyCaption,
    /// Capture contains no bytes.
    #[error("capture payload must not be empty")]
    EmptyPayload,
    /// Capture exceeds [`MAX_CAPTURE_BYTES`].
    #[error("capture too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual capture size in bytes.
        actual_bytes: usize,
    },
    /// Declared MIME type cannot be embedded in a data URL.
    #[error("invalid mime type: {0}")]
    InvalidMimeType(String),
    /// Stored payload is not a base64 data URL.
    #[error("invalid payload encoding: {0}")]
    InvalidPayload(String),
}

// ============================================================================
// SECTION: Types
// ============================================================================

/// Raw capture as handed over by a file picker or camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapture {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// Original file name.
    pub filename: String,
    /// Declared MIME type, when known.
    pub mime_type: Option<String>,
}

/// Transport form of a queued record.
///
/// # Invariants
/// - Field order matches the upload endpoint contract (`image_data`, `caption`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryForm {
    /// Encoded payload (data URL).
    pub image_data: String,
    /// Caption text.
    pub caption: String,
}

impl DeliveryForm {
    /// Returns the form fields as ordered name/value pairs.
    #[must_use]
    pub fn pairs(&self) -> [(&'static str, &str); 2] {
        [(FORM_FIELD_IMAGE_DATA, self.image_data.as_str()), (FORM_FIELD_CAPTION, self.caption.as_str())]
    }
}

/// Payload bytes recovered from a stored data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// MIME type declared in the data URL.
    pub mime_type: String,
    /// Raw image bytes.
    pub bytes: Vec<u8>,
}

// ============================================================================
// SECTION: Codec
// ============================================================================

/// Encodes a raw capture and caption into storable record fields.
///
/// # Errors
///
/// Returns [`CodecError`] when the caption is blank, the capture is empty or
/// oversized, or the MIME type cannot be embedded in a data URL.
pub fn encode(raw: &RawCapture, caption: &str) -> Result<NewRecord, CodecError> {
    let caption = Caption::parse(caption).ok_or(CodecError::EmptyCaption)?;
    if raw.bytes.is_empty() {
        return Err(CodecError::EmptyPayload);
    }
    if raw.bytes.len() > MAX_CAPTURE_BYTES {
        return Err(CodecError::TooLarge {
            max_bytes: MAX_CAPTURE_BYTES,
            actual_bytes: raw.bytes.len(),
        });
    }
    let mime_type = normalize_mime_type(raw.mime_type.as_deref())?;
    let filename = match raw.filename.trim() {
        "" => DEFAULT_FILENAME.to_string(),
        name => name.to_string(),
    };
    let payload = format!("{DATA_URL_PREFIX}{mime_type}{BASE64_MARKER},{}", STANDARD.encode(&raw.bytes));
    Ok(NewRecord {
        payload,
        caption,
        filename,
        size_bytes: u64::try_from(raw.bytes.len()).unwrap_or(u64::MAX),
        mime_type,
    })
}

/// Maps a stored record to its delivery form.
#[must_use]
pub fn decode(record: &QueueRecord) -> DeliveryForm {
    DeliveryForm {
        image_data: record.payload.clone(),
        caption: record.caption.as_str().to_string(),
    }
}

/// Recovers raw bytes and MIME type from a stored data URL payload.
///
/// # Errors
///
/// Returns [`CodecError::InvalidPayload`] when the payload is not a base64 data URL.
pub fn decode_payload(payload: &str) -> Result<DecodedPayload, CodecError> {
    let rest = payload
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| CodecError::InvalidPayload("missing data: prefix".to_string()))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| CodecError::InvalidPayload("missing data separator".to_string()))?;
    let mime_type = header
        .strip_suffix(BASE64_MARKER)
        .ok_or_else(|| CodecError::InvalidPayload("payload is not base64 encoded".to_string()))?;
    let mime_type = if mime_type.is_empty() { DEFAULT_MIME_TYPE } else { mime_type };
    let bytes =
        STANDARD.decode(data).map_err(|err| CodecError::InvalidPayload(err.to_string()))?;
    Ok(DecodedPayload {
        mime_type: mime_type.to_string(),
        bytes,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Normalizes a declared MIME type, falling back to [`DEFAULT_MIME_TYPE`].
fn normalize_mime_type(raw: Option<&str>) -> Result<String, CodecError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(DEFAULT_MIME_TYPE.to_string());
    };
    let normalized = raw.to_ascii_lowercase();
    let valid = normalized.split_once('/').is_some_and(|(kind, subtype)| {
        !kind.is_empty() && !subtype.is_empty() && normalized.bytes().all(is_mime_byte)
    });
    if !valid {
        return Err(CodecError::InvalidMimeType(raw.to_string()));
    }
    Ok(normalized)
}

/// Returns true for bytes allowed in a data URL media type.
const fn is_mime_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'/' | b'.' | b'+' | b'-')
}

// ============================================================================
// SECTION: Tests
// ============================================================================
