// crates/snapqueue-core/src/runtime/catalog.rs
// ============================================================================
// Module: Snapqueue Catalog Parsing
// Description: Parser for the remote images listing.
// Purpose: Turn untrusted catalog responses into typed items.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The listing endpoint answers with `{"code":"success","result":{"data":{"images":[...]}}}`.
//! A missing `images` list is treated as an empty catalog; a missing or wrong
//! success marker is an error.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::CatalogItem;
use crate::runtime::delivery::SUCCESS_FIELD;
use crate::runtime::delivery::SUCCESS_MARKER;

/// Catalog parsing errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Body is not valid JSON or has an unexpected shape.
    #[error("malformed catalog response: {0}")]
    Malformed(String),
    /// Body does not carry the success marker.
    #[error("catalog request not successful (code: {0})")]
    NotSuccessful(String),
}

/// Listing envelope.
#[derive(Deserialize)]
struct CatalogEnvelope {
    #[serde(default)]
    result: Option<CatalogResult>,
}

#[derive(Deserialize)]
struct CatalogResult {
    #[serde(default)]
    data: Option<CatalogData>,
}

#[derive(Deserialize)]
struct CatalogData {
    #[serde(default)]
    images: Vec<CatalogItem>,
}

/// Parses a catalog response body.
///
/// # Errors
///
/// Returns [`CatalogError`] when the body is malformed or not successful.
pub fn parse_catalog(body: &[u8]) -> Result<Vec<CatalogItem>, CatalogError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| CatalogError::Malformed(err.to_string()))?;
    let code = value.get(SUCCESS_FIELD).and_then(Value::as_str).unwrap_or_default();
    if code != SUCCESS_MARKER {
        return Err(CatalogError::NotSuccessful(code.to_string()));
    }
    let envelope: CatalogEnvelope =
        serde_json::from_value(value).map_err(|err| CatalogError::Malformed(err.to_string()))?;
    Ok(envelope.result.and_then(|result| result.data).map(|data| data.images).unwrap_or_default())
}
