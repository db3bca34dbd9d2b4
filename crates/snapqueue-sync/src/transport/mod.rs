// crates/snapqueue-sync/src/transport/mod.rs
// ============================================================================
// Module: Snapqueue Transports
// Description: Upload and catalog transport interfaces.
// Purpose: Decouple the sync worker and foreground from HTTP specifics.
// Dependencies: async-trait, snapqueue-core, thiserror
// ============================================================================

//! ## Overview
//! Transports only move bytes. They never decide whether a delivery was
//! confirmed; that is the job of
//! [`classify_response`](snapqueue_core::classify_response). Any error
//! returned here means no usable response was received.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http;

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use snapqueue_core::CatalogError;
use snapqueue_core::CatalogItem;
use snapqueue_core::DeliveryForm;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Transport errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Transport configuration is invalid.
    #[error("transport config error: {0}")]
    Config(String),
    /// Request could not be completed.
    #[error("transport error: {0}")]
    Transport(String),
    /// Response body exceeded the configured limit.
    #[error("response exceeds size limit: {actual} bytes (max {limit})")]
    ResponseTooLarge {
        /// Observed size in bytes.
        actual: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
}

/// Catalog fetch errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogFetchError {
    /// Request failed before a response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Endpoint answered with a non-success status.
    #[error("catalog endpoint returned http status {0}")]
    Status(u16),
    /// Response body could not be parsed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

// ============================================================================
// SECTION: Interfaces
// ============================================================================

/// Raw endpoint response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

/// Sends delivery forms to the upload endpoint.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Sends one delivery form and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no usable response is received.
    async fn send(&self, form: &DeliveryForm) -> Result<EndpointResponse, TransportError>;
}

/// Lists images already held by the remote server.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetches the remote catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogFetchError`] when the catalog cannot be fetched or parsed.
    async fn fetch(&self) -> Result<Vec<CatalogItem>, CatalogFetchError>;
}
