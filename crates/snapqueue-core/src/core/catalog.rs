// crates/snapqueue-core/src/core/catalog.rs
// ============================================================================
// Module: Snapqueue Remote Catalog Model
// Description: Items listed by the remote images endpoint and gallery entries.
// Purpose: Describe the confirmed-upload view the foreground renders.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The remote catalog lists images the server already holds. The foreground
//! combines it with locally pending records into [`GalleryEntry`] values whose
//! sync state is derived purely from where the entry came from.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::RecordId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Catalog Items
// ============================================================================

/// Identifier assigned by the remote server (numeric or textual on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    /// Numeric server identifier.
    Number(u64),
    /// Textual server identifier.
    Text(String),
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Image listed by the remote catalog endpoint.
///
/// # Invariants
/// - Values are untrusted server output and are only rendered, never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Server identifier.
    pub id: RemoteId,
    /// Remote content URL.
    pub image_url: String,
    /// Caption stored by the server.
    #[serde(default)]
    pub caption: String,
}

// ============================================================================
// SECTION: Gallery Entries
// ============================================================================

/// Sync state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Present in the local queue; not yet confirmed by the server.
    Pending,
    /// Listed by the remote catalog.
    Confirmed,
}

/// Origin of a gallery entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntrySource {
    /// Local queue record.
    Local(RecordId),
    /// Remote catalog item.
    Remote(RemoteId),
}

/// Entry rendered by the foreground gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryEntry {
    /// Where the entry came from.
    pub source: EntrySource,
    /// Caption text.
    pub caption: String,
    /// Image reference: a data URL for local entries, a remote URL otherwise.
    pub image: String,
    /// Original file name for local entries.
    pub filename: Option<String>,
    /// Creation timestamp for local entries.
    pub created_at: Option<Timestamp>,
    /// Derived sync state.
    pub state: EntryState,
}
