// crates/snapqueue-cli/src/main.rs
// ============================================================================
// Module: Snapqueue CLI Entry Point
// Description: Command dispatcher for the capture queue and sync engine.
// Purpose: Queue captures offline, inspect the queue, and drive sync passes.
// Dependencies: clap, snapqueue-config, snapqueue-core, snapqueue-sync, tokio
// ============================================================================

//! ## Overview
//! `snapqueue` is the operator surface of the capture queue. Captures are
//! committed to the durable store first; delivery happens in explicit `sync`
//! passes or in the long-running `run` daemon. Inputs are untrusted: file
//! reads are bounded and configuration is validated before use.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use snapqueue_config::LogSinkKind;
use snapqueue_config::LoggingConfig;
use snapqueue_config::QueueStoreType;
use snapqueue_config::SnapqueueConfig;
use snapqueue_core::InMemoryQueueStore;
use snapqueue_core::MAX_CAPTURE_BYTES;
use snapqueue_core::QueueStore;
use snapqueue_core::QueueStoreProvider;
use snapqueue_core::RawCapture;
use snapqueue_core::RecordId;
use snapqueue_core::RecordSummary;
use snapqueue_core::SharedQueueStore;
use snapqueue_core::runtime::codec;
use snapqueue_core::runtime::gallery;
use snapqueue_store_sqlite::SqliteQueueStorePool;
use snapqueue_sync::CatalogClient;
use snapqueue_sync::ConnectivityMonitor;
use snapqueue_sync::FileSyncEventSink;
use snapqueue_sync::HttpCatalogClient;
use snapqueue_sync::HttpEndpointConfig;
use snapqueue_sync::HttpUploadTransport;
use snapqueue_sync::NoopSyncEventSink;
use snapqueue_sync::RetryPolicy;
use snapqueue_sync::StderrSyncEventSink;
use snapqueue_sync::SyncCoordinator;
use snapqueue_sync::SyncEvent;
use snapqueue_sync::SyncEventSink;
use snapqueue_sync::SyncNotifier;
use snapqueue_sync::SyncTrigger;
use snapqueue_sync::SyncWorker;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "snapqueue", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to snapqueue.toml or `SNAPQUEUE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Queue a capture in the durable store.
    Enqueue(EnqueueCommand),
    /// List records waiting for delivery.
    List(ListCommand),
    /// Run one delivery pass and report the result.
    Sync,
    /// Run the sync daemon until interrupted.
    Run,
    /// Show the gallery of pending and confirmed images.
    Catalog,
    /// Write a queued record's image bytes to a file.
    Export(ExportCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `enqueue`.
#[derive(Args, Debug)]
struct EnqueueCommand {
    /// Image file to queue.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
    /// Caption stored with the image.
    #[arg(long)]
    caption: String,
    /// MIME type override (guessed from the extension otherwise).
    #[arg(long, value_name = "TYPE")]
    mime_type: Option<String>,
    /// Run a delivery pass right after queueing.
    #[arg(long)]
    sync: bool,
}

/// Output format for listings.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    /// One tab-separated line per record.
    #[default]
    Text,
    /// JSON array.
    Json,
}

/// Arguments for `list`.
#[derive(Args, Debug)]
struct ListCommand {
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Arguments for `export`.
#[derive(Args, Debug)]
struct ExportCommand {
    /// Record identifier.
    #[arg(long)]
    id: u64,
    /// Destination file.
    #[arg(long, value_name = "PATH")]
    output: PathBuf,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a snapqueue configuration file.
    Validate,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Enqueue(command) => command_enqueue(config_path, command).await,
        Commands::List(command) => command_list(config_path, &command),
        Commands::Sync => command_sync(config_path).await,
        Commands::Run => command_run(config_path).await,
        Commands::Catalog => command_catalog(config_path).await,
        Commands::Export(command) => command_export(config_path, &command),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(config_path),
    }
}

// ============================================================================
// SECTION: Runtime Assembly
// ============================================================================

/// Loaded configuration with the store and event sink it selects.
struct Runtime {
    /// Validated configuration.
    config: SnapqueueConfig,
    /// Queue store provider.
    provider: Arc<dyn QueueStoreProvider>,
    /// Structured event sink.
    events: Arc<dyn SyncEventSink>,
}

impl Runtime {
    /// Loads configuration and assembles the store provider and sink.
    fn load(config_path: Option<&Path>) -> CliResult<Self> {
        let config = SnapqueueConfig::load(config_path)
            .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
        let provider: Arc<dyn QueueStoreProvider> = match config.store.sqlite_config() {
            Some(sqlite) => Arc::new(SqliteQueueStorePool::new(sqlite)),
            None => Arc::new(SharedQueueStore::from_store(InMemoryQueueStore::new())),
        };
        let events = build_event_sink(&config.logging)?;
        Ok(Self {
            config,
            provider,
            events,
        })
    }

    /// Loads configuration for a one-shot command that needs a durable queue.
    ///
    /// The memory backend forgets every record when the process exits, so
    /// only the long-running `run` daemon may use it.
    fn load_durable(config_path: Option<&Path>, command: &str) -> CliResult<Self> {
        let runtime = Self::load(config_path)?;
        require_durable_store(&runtime.config, command)?;
        Ok(runtime)
    }

    /// Acquires the queue store.
    fn store(&self) -> CliResult<SharedQueueStore> {
        self.provider
            .acquire()
            .map_err(|err| CliError::new(format!("queue store unavailable: {err}")))
    }

    /// Builds a sync worker delivering to the configured upload endpoint.
    fn worker(&self) -> CliResult<SyncWorker> {
        let mut endpoint = HttpEndpointConfig::parse(&self.config.endpoint.upload_url)
            .map_err(|err| CliError::new(format!("invalid upload endpoint: {err}")))?;
        endpoint.timeout = self.config.endpoint.request_timeout();
        endpoint.max_response_bytes = self.config.endpoint.max_response_bytes;
        let transport = HttpUploadTransport::new(endpoint)
            .map_err(|err| CliError::new(format!("failed to build upload client: {err}")))?;
        Ok(SyncWorker::new(
            Arc::clone(&self.provider),
            Arc::new(transport),
            SyncNotifier::default(),
            retry_policy(&self.config),
            Arc::clone(&self.events),
        ))
    }
}

/// Rejects the memory backend for commands whose records must outlive the process.
fn require_durable_store(config: &SnapqueueConfig, command: &str) -> CliResult<()> {
    match config.store.store_type {
        QueueStoreType::Sqlite => Ok(()),
        QueueStoreType::Memory => Err(CliError::new(format!(
            "`{command}` requires the sqlite store; the memory store does not persist between \
             invocations"
        ))),
    }
}

/// Maps configured pacing onto a retry policy.
fn retry_policy(config: &SnapqueueConfig) -> RetryPolicy {
    RetryPolicy {
        inter_record_delay: config.sync.inter_record_delay(),
        request_timeout: config.endpoint.request_timeout(),
        periodic_interval: config.sync.periodic_interval(),
    }
}

/// Builds the configured event sink.
fn build_event_sink(logging: &LoggingConfig) -> CliResult<Arc<dyn SyncEventSink>> {
    match logging.sink {
        LogSinkKind::Stderr => Ok(Arc::new(StderrSyncEventSink)),
        LogSinkKind::None => Ok(Arc::new(NoopSyncEventSink)),
        LogSinkKind::File => {
            let path = logging
                .path
                .as_deref()
                .ok_or_else(|| CliError::new("file logging requires logging.path".to_string()))?;
            let sink = FileSyncEventSink::new(path)
                .map_err(|err| CliError::new(format!("failed to open event log: {err}")))?;
            Ok(Arc::new(sink))
        }
    }
}

// ============================================================================
// SECTION: Queue Commands
// ============================================================================

/// Executes the `enqueue` command.
async fn command_enqueue(config_path: Option<&Path>, command: EnqueueCommand) -> CliResult<ExitCode> {
    let runtime = Runtime::load_durable(config_path, "enqueue")?;
    let bytes = read_bytes_with_limit(&command.file, MAX_CAPTURE_BYTES).map_err(|err| match err {
        ReadLimitError::Io(err) => CliError::new(format!(
            "failed to read {}: {err}",
            command.file.display()
        )),
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!("capture is {size} bytes; the limit is {limit} bytes")),
    })?;
    let filename = command
        .file
        .file_name()
        .map_or_else(|| "capture".to_string(), |name| name.to_string_lossy().into_owned());
    let mime_type = command.mime_type.clone().or_else(|| guess_mime_type(&command.file));
    let raw = RawCapture {
        bytes,
        filename,
        mime_type,
    };
    let record = codec::encode(&raw, &command.caption)
        .map_err(|err| CliError::new(format!("capture rejected: {err}")))?;
    let id = runtime
        .store()?
        .insert(record)
        .map_err(|err| CliError::new(format!("failed to queue capture: {err}")))?;
    runtime.events.record(&SyncEvent::capture_stored(id, command.sync));
    write_line(&format!("queued record {id}"))?;
    if command.sync {
        let report = runtime
            .worker()?
            .run_pass(SyncTrigger::Manual)
            .await
            .map_err(|err| CliError::new(format!("sync pass aborted: {err}")))?;
        write_json(&report)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `list` command.
fn command_list(config_path: Option<&Path>, command: &ListCommand) -> CliResult<ExitCode> {
    let runtime = Runtime::load_durable(config_path, "list")?;
    let summaries: Vec<RecordSummary> = runtime
        .store()?
        .list_all()
        .map_err(|err| CliError::new(format!("failed to list queue: {err}")))?
        .iter()
        .map(snapqueue_core::QueueRecord::summary)
        .collect();
    match command.format {
        OutputFormat::Json => write_json(&summaries)?,
        OutputFormat::Text => {
            for summary in &summaries {
                write_line(&summary_line(summary))?;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `export` command.
fn command_export(config_path: Option<&Path>, command: &ExportCommand) -> CliResult<ExitCode> {
    let runtime = Runtime::load_durable(config_path, "export")?;
    let id = parse_record_id(command.id)?;
    let record = runtime
        .store()?
        .get(id)
        .map_err(|err| CliError::new(format!("failed to read record {id}: {err}")))?
        .ok_or_else(|| CliError::new(format!("record {id} not found")))?;
    let decoded = codec::decode_payload(&record.payload)
        .map_err(|err| CliError::new(format!("record {id} payload unreadable: {err}")))?;
    fs::write(&command.output, &decoded.bytes).map_err(|err| {
        CliError::new(format!("failed to write {}: {err}", command.output.display()))
    })?;
    write_line(&format!(
        "exported {} bytes ({}) to {}",
        decoded.bytes.len(),
        decoded.mime_type,
        command.output.display()
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Sync Commands
// ============================================================================

/// Executes the `sync` command.
async fn command_sync(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let runtime = Runtime::load_durable(config_path, "sync")?;
    let report = runtime
        .worker()?
        .run_pass(SyncTrigger::Manual)
        .await
        .map_err(|err| CliError::new(format!("sync pass aborted: {err}")))?;
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `run` command.
async fn command_run(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let runtime = Runtime::load(config_path)?;
    let coordinator = SyncCoordinator::new(runtime.worker()?, ConnectivityMonitor::default());
    // An aborted lifecycle pass is already logged; later triggers retry.
    let _ = coordinator.activate().await;
    coordinator.start_periodic();
    let signal = tokio::signal::ctrl_c().await;
    coordinator.shutdown().await;
    signal.map_err(|err| CliError::new(format!("failed to wait for shutdown signal: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `catalog` command.
async fn command_catalog(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let runtime = Runtime::load_durable(config_path, "catalog")?;
    let catalog_url = runtime
        .config
        .endpoint
        .catalog_url
        .as_deref()
        .ok_or_else(|| CliError::new("endpoint.catalog_url is not configured".to_string()))?;
    let mut endpoint = HttpEndpointConfig::parse(catalog_url)
        .map_err(|err| CliError::new(format!("invalid catalog endpoint: {err}")))?;
    endpoint.timeout = runtime.config.endpoint.request_timeout();
    endpoint.max_response_bytes = runtime.config.endpoint.max_response_bytes;
    let client = HttpCatalogClient::new(endpoint)
        .map_err(|err| CliError::new(format!("failed to build catalog client: {err}")))?;
    let local = runtime
        .store()?
        .list_all()
        .map_err(|err| CliError::new(format!("failed to list queue: {err}")))?;
    let remote = match client.fetch().await {
        Ok(items) => items,
        Err(err) => {
            runtime.events.record(&SyncEvent::catalog_unavailable(&err.to_string()));
            Vec::new()
        }
    };
    write_json(&gallery::merge(&local, &remote))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes the config validation command.
fn command_config_validate(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let _config = SnapqueueConfig::load(config_path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_line("config ok")?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Guesses an image MIME type from the file extension.
fn guess_mime_type(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_string_lossy().to_ascii_lowercase();
    let mime = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        _ => return None,
    };
    Some(mime.to_string())
}

/// Parses a user-supplied record identifier.
fn parse_record_id(raw: u64) -> CliResult<RecordId> {
    RecordId::from_raw(raw)
        .ok_or_else(|| CliError::new("record id must be greater than zero".to_string()))
}

/// Renders a record summary as one tab-separated line.
fn summary_line(summary: &RecordSummary) -> String {
    let created = summary
        .created_at
        .to_rfc3339()
        .unwrap_or_else(|| summary.created_at.as_unix_millis().to_string());
    format!(
        "{}\t{}\t{}\t{}\t{}",
        summary.id, created, summary.size_bytes, summary.mime_type, summary.caption
    )
}

/// Writes a value as pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render output: {err}")))?;
    write_line(&text)
}

/// Writes a line to stdout.
fn write_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
