// crates/snapqueue-sync/src/transport/http.rs
// ============================================================================
// Module: Snapqueue HTTP Transports
// Description: reqwest-backed upload transport and catalog client.
// Purpose: Deliver queued records and list remote images over HTTP.
// Dependencies: reqwest, url, async-trait
// ============================================================================

//! ## Overview
//! Uploads are `POST` requests with an `application/x-www-form-urlencoded`
//! body carrying `image_data` and `caption`. Redirects are not followed and
//! response bodies are read with a hard byte limit.
//! Security posture: remote responses are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use snapqueue_core::CatalogItem;
use snapqueue_core::DeliveryForm;
use snapqueue_core::parse_catalog;
use url::Url;
use url::form_urlencoded;

use crate::transport::CatalogClient;
use crate::transport::CatalogFetchError;
use crate::transport::EndpointResponse;
use crate::transport::TransportError;
use crate::transport::UploadTransport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum response body size.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;
/// Content type of upload requests.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// ============================================================================
// SECTION: Config
// ============================================================================

/// HTTP endpoint settings shared by both clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEndpointConfig {
    /// Endpoint URL.
    pub url: Url,
    /// Client-level request timeout.
    pub timeout: Duration,
    /// Maximum response body size in bytes.
    pub max_response_bytes: usize,
}

impl HttpEndpointConfig {
    /// Parses an endpoint URL with default limits.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] for unparseable or non-HTTP URLs.
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let url = Url::parse(url).map_err(|err| TransportError::Config(err.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(TransportError::Config(format!("unsupported url scheme: {scheme}")));
            }
        }
        Ok(Self {
            url,
            timeout: Duration::from_secs(30),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        })
    }

    /// Builds the reqwest client for this endpoint.
    fn client(&self) -> Result<Client, TransportError> {
        Client::builder()
            .timeout(self.timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|err| TransportError::Config(err.to_string()))
    }
}

// ============================================================================
// SECTION: Upload Transport
// ============================================================================

/// HTTP upload transport.
#[derive(Debug, Clone)]
pub struct HttpUploadTransport {
    /// HTTP client.
    client: Client,
    /// Endpoint settings.
    config: HttpEndpointConfig,
}

impl HttpUploadTransport {
    /// Builds an upload transport for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] when the HTTP client cannot be constructed.
    pub fn new(config: HttpEndpointConfig) -> Result<Self, TransportError> {
        let client = config.client()?;
        Ok(Self {
            client,
            config,
        })
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn send(&self, form: &DeliveryForm) -> Result<EndpointResponse, TransportError> {
        let body = encode_form(form);
        let response = self
            .client
            .post(self.config.url.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|err| TransportError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = read_response_body_with_limit(response, self.config.max_response_bytes).await?;
        Ok(EndpointResponse {
            status,
            body,
        })
    }
}

// ============================================================================
// SECTION: Catalog Client
// ============================================================================

/// HTTP catalog client.
#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    /// HTTP client.
    client: Client,
    /// Endpoint settings.
    config: HttpEndpointConfig,
}

impl HttpCatalogClient {
    /// Builds a catalog client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] when the HTTP client cannot be constructed.
    pub fn new(config: HttpEndpointConfig) -> Result<Self, TransportError> {
        let client = config.client()?;
        Ok(Self {
            client,
            config,
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch(&self) -> Result<Vec<CatalogItem>, CatalogFetchError> {
        let response = self
            .client
            .get(self.config.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| TransportError::Transport(err.to_string()))?;
        let status = response.status();
        let body = read_response_body_with_limit(response, self.config.max_response_bytes).await?;
        if !status.is_success() {
            return Err(CatalogFetchError::Status(status.as_u16()));
        }
        Ok(parse_catalog(&body)?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Encodes a delivery form as an urlencoded body.
#[must_use]
pub fn encode_form(form: &DeliveryForm) -> String {
    form_urlencoded::Serializer::new(String::new()).extend_pairs(form.pairs()).finish()
}

/// Reads a response body while enforcing a hard byte limit.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    let mut total: usize = 0;
    while let Some(chunk) =
        response.chunk().await.map_err(|err| TransportError::Transport(err.to_string()))?
    {
        let next_total = total.checked_add(chunk.len()).ok_or(TransportError::ResponseTooLarge {
            actual: usize::MAX,
            limit,
        })?;
        if next_total > limit {
            return Err(TransportError::ResponseTooLarge {
                actual: next_total,
                limit,
            });
        }
        body.extend_from_slice(&chunk);
        total = next_total;
    }
    Ok(body)
}
