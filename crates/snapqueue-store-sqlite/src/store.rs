// crates/snapqueue-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Queue Store
// Description: Durable QueueStore backed by SQLite WAL.
// Purpose: Persist pending captures with schema versioning and integrity hashes.
// Dependencies: snapqueue-core, rusqlite, serde, sha2, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`QueueStore`] using `SQLite`. Records live
//! in a single `queue_records` table keyed by an `AUTOINCREMENT` rowid, so
//! identifiers are never reused even after deletion. Each row stores a SHA-256
//! hash of its payload; reads verify the hash and fail closed on mismatch.
//! Schema creation and migration run inside an immediate transaction so
//! concurrent openers serialize instead of racing.
//! Security posture: database contents are untrusted.

// ============================================================================//
// SECTION: Imports
// ============================================================================//

use std::fmt::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use sha2::Digest;
use sha2::Sha256;
use snapqueue_core::Caption;
use snapqueue_core::NewRecord;
use snapqueue_core::QueueRecord;
use snapqueue_core::QueueStore;
use snapqueue_core::QueueStoreProvider;
use snapqueue_core::RecordId;
use snapqueue_core::SharedQueueStore;
use snapqueue_core::StoreError;
use snapqueue_core::Timestamp;
use thiserror::Error;

// ============================================================================//
// SECTION: Constants
// ============================================================================//

/// `SQLite` schema version for the store.
pub const SCHEMA_VERSION: i64 = 2;
/// Schema version before payload hashes were introduced.
const LEGACY_SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum encoded payload size accepted by the store.
pub const MAX_PAYLOAD_BYTES: usize = 40 * 1024 * 1024;
/// Columns selected for every record read.
const RECORD_COLUMNS: &str =
    "id, payload, payload_hash, caption, filename, size_bytes, mime_type, created_at, synced";

// ============================================================================//
// SECTION: Config
// ============================================================================//

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` queue store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Maximum encoded payload size accepted on insert.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

impl SqliteStoreConfig {
    /// Creates a configuration with default settings for the given path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            max_payload_bytes: MAX_PAYLOAD_BYTES,
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default maximum payload size.
const fn default_max_payload_bytes() -> usize {
    MAX_PAYLOAD_BYTES
}

// ============================================================================//
// SECTION: Errors
// ============================================================================//

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Payload exceeded configured size limits.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) | SqliteStoreError::Db(message) => Self::Io(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "payload exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

/// Maps a rusqlite error into a store db error.
fn db_err(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================//
// SECTION: Store
// ============================================================================//

/// `SQLite`-backed queue store with WAL support.
#[derive(Clone)]
pub struct SqliteQueueStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteQueueStore {
    /// Opens the store, creating or migrating the schema as needed.
    ///
    /// Opening is idempotent and safe to run concurrently against the same file.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn open(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Inserts a record and returns its assigned identifier.
    fn insert_record(&self, record: &NewRecord) -> Result<RecordId, SqliteStoreError> {
        if record.payload.len() > self.config.max_payload_bytes {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: self.config.max_payload_bytes,
                actual_bytes: record.payload.len(),
            });
        }
        let size_bytes = i64::try_from(record.size_bytes)
            .map_err(|_| SqliteStoreError::Invalid("size_bytes out of range".to_string()))?;
        let payload_hash = payload_hash(&record.payload);
        let created_at = Timestamp::now().as_unix_millis();
        let rowid = {
            let mut guard = self.lock()?;
            let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_err)?;
            tx.execute(
                "INSERT INTO queue_records (payload, payload_hash, caption, filename, size_bytes, \
                 mime_type, created_at, synced) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
                params![
                    record.payload,
                    payload_hash,
                    record.caption.as_str(),
                    record.filename,
                    size_bytes,
                    record.mime_type,
                    created_at
                ],
            )
            .map_err(db_err)?;
            let rowid = tx.last_insert_rowid();
            tx.commit().map_err(db_err)?;
            drop(guard);
            rowid
        };
        RecordId::from_rowid(rowid)
            .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid rowid assigned: {rowid}")))
    }

    /// Lists all records ordered by creation time.
    fn list_records(&self) -> Result<Vec<QueueRecord>, SqliteStoreError> {
        let rows = {
            let guard = self.lock()?;
            let mut statement = guard
                .prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM queue_records ORDER BY created_at ASC, id ASC"
                ))
                .map_err(db_err)?;
            let rows = statement
                .query_map(params![], StoredRow::from_row)
                .map_err(db_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_err)?;
            drop(statement);
            drop(guard);
            rows
        };
        rows.into_iter().map(StoredRow::into_record).collect()
    }

    /// Loads a single record.
    fn load_record(&self, id: RecordId) -> Result<Option<QueueRecord>, SqliteStoreError> {
        let raw_id = rowid_of(id)?;
        let row = {
            let guard = self.lock()?;
            let row = guard
                .query_row(
                    &format!("SELECT {RECORD_COLUMNS} FROM queue_records WHERE id = ?1"),
                    params![raw_id],
                    StoredRow::from_row,
                )
                .optional()
                .map_err(db_err)?;
            drop(guard);
            row
        };
        row.map(StoredRow::into_record).transpose()
    }

    /// Deletes a record; absent identifiers are a no-op.
    fn remove_record(&self, id: RecordId) -> Result<(), SqliteStoreError> {
        let raw_id = rowid_of(id)?;
        let mut guard = self.lock()?;
        let tx = guard.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_err)?;
        tx.execute("DELETE FROM queue_records WHERE id = ?1", params![raw_id]).map_err(db_err)?;
        tx.commit().map_err(db_err)?;
        drop(guard);
        Ok(())
    }
}

impl QueueStore for SqliteQueueStore {
    fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError> {
        self.insert_record(&record).map_err(StoreError::from)
    }

    fn list_all(&self) -> Result<Vec<QueueRecord>, StoreError> {
        self.list_records().map_err(StoreError::from)
    }

    fn remove(&self, id: RecordId) -> Result<(), StoreError> {
        self.remove_record(id).map_err(StoreError::from)
    }

    fn get(&self, id: RecordId) -> Result<Option<QueueRecord>, StoreError> {
        self.load_record(id).map_err(StoreError::from)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        let guard = self.lock().map_err(StoreError::from)?;
        guard
            .query_row("SELECT 1", params![], |row| row.get::<_, i64>(0))
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        drop(guard);
        Ok(())
    }
}

// ============================================================================//
// SECTION: Pool
// ============================================================================//

/// Lazily opened, shared handle to a [`SqliteQueueStore`].
///
/// The first successful [`acquire`](QueueStoreProvider::acquire) opens the
/// store; later calls hand out clones of the same handle. A failed open is
/// reported as [`StoreError::Unavailable`] and attempted again on the next call.
pub struct SqliteQueueStorePool {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Opened store, once available.
    slot: Mutex<Option<SharedQueueStore>>,
}

impl SqliteQueueStorePool {
    /// Creates a pool that opens the store on first acquisition.
    #[must_use]
    pub const fn new(config: SqliteStoreConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(None),
        }
    }
}

impl QueueStoreProvider for SqliteQueueStorePool {
    fn acquire(&self) -> Result<SharedQueueStore, StoreError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StoreError::Unavailable("store pool mutex poisoned".to_string()))?;
        if let Some(store) = slot.as_ref() {
            return Ok(store.clone());
        }
        let store = SqliteQueueStore::open(self.config.clone())
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let shared = SharedQueueStore::from_store(store);
        *slot = Some(shared.clone());
        drop(slot);
        Ok(shared)
    }
}

// ============================================================================//
// SECTION: Rows
// ============================================================================//

/// Raw column values of a stored record.
struct StoredRow {
    id: i64,
    payload: String,
    payload_hash: String,
    caption: String,
    filename: String,
    size_bytes: i64,
    mime_type: String,
    created_at: i64,
    synced: i64,
}

impl StoredRow {
    /// Reads raw columns in [`RECORD_COLUMNS`] order.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            payload: row.get(1)?,
            payload_hash: row.get(2)?,
            caption: row.get(3)?,
            filename: row.get(4)?,
            size_bytes: row.get(5)?,
            mime_type: row.get(6)?,
            created_at: row.get(7)?,
            synced: row.get(8)?,
        })
    }

    /// Validates the row and converts it into a queue record.
    fn into_record(self) -> Result<QueueRecord, SqliteStoreError> {
        let id = RecordId::from_rowid(self.id)
            .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid record id: {}", self.id)))?;
        if payload_hash(&self.payload) != self.payload_hash {
            return Err(SqliteStoreError::Corrupt(format!("payload hash mismatch for record {id}")));
        }
        let caption = Caption::parse(&self.caption)
            .ok_or_else(|| SqliteStoreError::Corrupt(format!("empty caption for record {id}")))?;
        let size_bytes = u64::try_from(self.size_bytes)
            .map_err(|_| SqliteStoreError::Corrupt(format!("negative size for record {id}")))?;
        Ok(QueueRecord {
            id,
            payload: self.payload,
            caption,
            filename: self.filename,
            size_bytes,
            mime_type: self.mime_type,
            created_at: Timestamp::from_unix_millis(self.created_at),
            synced: self.synced != 0,
        })
    }
}

// ============================================================================//
// SECTION: Helpers
// ============================================================================//

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_err)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_err)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_err)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_err)?;
    Ok(())
}

/// Creates the schema, migrates older versions, or rejects unknown ones.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate).map_err(db_err)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_err)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_err)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_err)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS queue_records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    payload TEXT NOT NULL,
                    payload_hash TEXT NOT NULL,
                    caption TEXT NOT NULL,
                    filename TEXT NOT NULL,
                    size_bytes INTEGER NOT NULL,
                    mime_type TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    synced INTEGER NOT NULL DEFAULT 0
                );
                CREATE INDEX IF NOT EXISTS idx_queue_records_created_at
                    ON queue_records (created_at);",
            )
            .map_err(db_err)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) if value == LEGACY_SCHEMA_VERSION => migrate_v1_to_v2(&tx)?,
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_err)?;
    Ok(())
}

/// Adds payload hashes to a version 1 schema without dropping records.
fn migrate_v1_to_v2(tx: &Transaction<'_>) -> Result<(), SqliteStoreError> {
    tx.execute_batch(
        "ALTER TABLE queue_records ADD COLUMN payload_hash TEXT NOT NULL DEFAULT '';
         CREATE INDEX IF NOT EXISTS idx_queue_records_created_at
             ON queue_records (created_at);",
    )
    .map_err(db_err)?;
    let rows: Vec<(i64, String)> = {
        let mut statement = tx.prepare("SELECT id, payload FROM queue_records").map_err(db_err)?;
        statement
            .query_map(params![], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?
    };
    for (id, payload) in rows {
        tx.execute(
            "UPDATE queue_records SET payload_hash = ?1 WHERE id = ?2",
            params![payload_hash(&payload), id],
        )
        .map_err(db_err)?;
    }
    tx.execute("UPDATE store_meta SET version = ?1", params![SCHEMA_VERSION]).map_err(db_err)?;
    Ok(())
}

/// Converts a record identifier into a rowid.
fn rowid_of(id: RecordId) -> Result<i64, SqliteStoreError> {
    i64::try_from(id.get())
        .map_err(|_| SqliteStoreError::Invalid(format!("record id out of range: {id}")))
}

/// Returns the lowercase hex SHA-256 digest of a payload.
fn payload_hash(payload: &str) -> String {
    let digest = Sha256::digest(payload.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
