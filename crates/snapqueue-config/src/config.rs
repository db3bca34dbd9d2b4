// crates/snapqueue-config/src/config.rs
// ============================================================================
// Module: Snapqueue Configuration
// Description: Configuration loading and validation for the capture queue.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: snapqueue-store-sqlite, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, else `SNAPQUEUE_CONFIG`, else
//! `snapqueue.toml` in the working directory. Missing or invalid
//! configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use snapqueue_store_sqlite::SqliteStoreConfig;
use snapqueue_store_sqlite::SqliteStoreMode;
use snapqueue_store_sqlite::SqliteSyncMode;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "snapqueue.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SNAPQUEUE_CONFIG";
/// Maximum config file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of a full path.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default queue database path.
const DEFAULT_STORE_PATH: &str = "snapqueue.sqlite";
/// Default busy timeout for `SQLite` connections.
const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default maximum encoded payload size.
const DEFAULT_STORE_MAX_PAYLOAD_BYTES: usize = 40 * 1024 * 1024;
/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Upper bound for the per-request timeout.
pub(crate) const MAX_REQUEST_TIMEOUT_MS: u64 = 600_000;
/// Default response body cap.
const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;
/// Upper bound for the response body cap.
pub(crate) const MAX_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;
/// Default periodic trigger interval.
const DEFAULT_PERIODIC_INTERVAL_MS: u64 = 30_000;
/// Default pause between delivery attempts.
const DEFAULT_INTER_RECORD_DELAY_MS: u64 = 1_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Snapqueue configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapqueueConfig {
    /// Durable queue store configuration.
    #[serde(default)]
    pub store: QueueStoreConfig,
    /// Remote endpoints.
    pub endpoint: EndpointConfig,
    /// Sync pacing configuration.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Structured event logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SnapqueueConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.endpoint.validate()?;
        self.sync.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Queue store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueStoreType {
    /// Volatile in-memory queue.
    Memory,
    /// Durable `SQLite` queue.
    #[default]
    Sqlite,
}

/// Queue store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueStoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: QueueStoreType,
    /// `SQLite` database path; defaults to `snapqueue.sqlite` for the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Maximum encoded payload size accepted on insert.
    #[serde(default = "default_store_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl Default for QueueStoreConfig {
    fn default() -> Self {
        Self {
            store_type: QueueStoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            max_payload_bytes: default_store_max_payload_bytes(),
        }
    }
}

impl QueueStoreConfig {
    /// Returns the `SQLite` store settings, or `None` for the memory backend.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match self.store_type {
            QueueStoreType::Memory => None,
            QueueStoreType::Sqlite => Some(SqliteStoreConfig {
                path: self.sqlite_path(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
                max_payload_bytes: self.max_payload_bytes,
            }),
        }
    }

    /// Returns the configured database path or the default.
    fn sqlite_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH))
    }

    /// Validates queue store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            QueueStoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path".to_string(),
                    ));
                }
            }
            QueueStoreType::Sqlite => validate_store_path(&self.sqlite_path())?,
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "store max_payload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Remote endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Upload endpoint receiving `image_data` and `caption` form posts.
    pub upload_url: String,
    /// Optional catalog endpoint listing confirmed images.
    #[serde(default)]
    pub catalog_url: Option<String>,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum response body size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl EndpointConfig {
    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validates endpoint configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("endpoint.upload_url", &self.upload_url)?;
        if let Some(catalog_url) = &self.catalog_url {
            validate_http_url("endpoint.catalog_url", catalog_url)?;
        }
        if self.request_timeout_ms == 0 || self.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "endpoint.request_timeout_ms must be between 1 and {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_MAX_RESPONSE_BYTES {
            return Err(ConfigError::Invalid(format!(
                "endpoint.max_response_bytes must be between 1 and {MAX_MAX_RESPONSE_BYTES}"
            )));
        }
        Ok(())
    }
}

/// Sync pacing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Interval between periodic passes in milliseconds.
    #[serde(default = "default_periodic_interval_ms")]
    pub periodic_interval_ms: u64,
    /// Pause between delivery attempts within a pass in milliseconds.
    #[serde(default = "default_inter_record_delay_ms")]
    pub inter_record_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            periodic_interval_ms: default_periodic_interval_ms(),
            inter_record_delay_ms: default_inter_record_delay_ms(),
        }
    }
}

impl SyncConfig {
    /// Returns the periodic trigger interval.
    #[must_use]
    pub const fn periodic_interval(&self) -> Duration {
        Duration::from_millis(self.periodic_interval_ms)
    }

    /// Returns the pause between delivery attempts.
    #[must_use]
    pub const fn inter_record_delay(&self) -> Duration {
        Duration::from_millis(self.inter_record_delay_ms)
    }

    /// Validates sync configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.periodic_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sync.periodic_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Event sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Events are discarded.
    None,
}

/// Structured event logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Sink receiving sync events.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("file logging requires logging.path".to_string()))
            }
            (LogSinkKind::File, Some(path)) => {
                validate_path_string("logging.path", &path.to_string_lossy())
            }
            (_, Some(_)) => Err(ConfigError::Invalid(
                "logging.path is only valid with the file sink".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the queue database path.
fn validate_store_path(path: &Path) -> Result<(), ConfigError> {
    validate_path_string("store path", &path.to_string_lossy())
}

/// Validates that a URL parses and uses an HTTP scheme.
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::Invalid(format!("{field} must use http or https, got {scheme}"))),
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Returns the default maximum payload size.
const fn default_store_max_payload_bytes() -> usize {
    DEFAULT_STORE_MAX_PAYLOAD_BYTES
}

/// Returns the default per-request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Returns the default response body cap.
const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

/// Returns the default periodic trigger interval.
const fn default_periodic_interval_ms() -> u64 {
    DEFAULT_PERIODIC_INTERVAL_MS
}

/// Returns the default pause between delivery attempts.
const fn default_inter_record_delay_ms() -> u64 {
    DEFAULT_INTER_RECORD_DELAY_MS
}

// ============================================================================
// SECTION: Tests
// ============================================================================
