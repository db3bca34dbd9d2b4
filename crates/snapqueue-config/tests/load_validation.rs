//! Config load validation tests for snapqueue-config.
// crates/snapqueue-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use common::TestResult;
use common::assert_invalid;
use snapqueue_config::ConfigError;
use snapqueue_config::LogSinkKind;
use snapqueue_config::QueueStoreType;
use snapqueue_config::SnapqueueConfig;
use tempfile::NamedTempFile;

mod common;

fn write_config(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(SnapqueueConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        SnapqueueConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&vec![b'#'; 1_048_577])?;
    assert_invalid(SnapqueueConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_config(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(SnapqueueConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_reports_missing_file_as_io() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    match SnapqueueConfig::load(Some(&dir.path().join("absent.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got {other:?}")),
    }
}

#[test]
fn load_reports_syntax_errors_as_parse() -> TestResult {
    let file = write_config(b"[endpoint\nupload_url = 3")?;
    assert_invalid(SnapqueueConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_rejects_unknown_fields() -> TestResult {
    let file = write_config(
        br#"
[endpoint]
upload_url = "https://uploads.example.com/upload"
retries = 3
"#,
    )?;
    assert_invalid(SnapqueueConfig::load(Some(file.path())), "unknown field")
}

#[test]
fn load_requires_endpoint_section() -> TestResult {
    let file = write_config(b"[sync]\nperiodic_interval_ms = 1000\n")?;
    assert_invalid(SnapqueueConfig::load(Some(file.path())), "endpoint")
}

#[test]
fn load_accepts_full_document() -> TestResult {
    let file = write_config(
        br#"
[store]
type = "sqlite"
path = "data/queue.sqlite"
busy_timeout_ms = 2500
journal_mode = "wal"
sync_mode = "normal"

[endpoint]
upload_url = "http://127.0.0.1:8080/upload"
catalog_url = "http://127.0.0.1:8080/images"
request_timeout_ms = 10000
max_response_bytes = 65536

[sync]
periodic_interval_ms = 15000
inter_record_delay_ms = 0

[logging]
sink = "file"
path = "logs/sync.jsonl"
"#,
    )?;
    let config = SnapqueueConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.store.store_type != QueueStoreType::Sqlite {
        return Err("expected sqlite store".to_string());
    }
    let sqlite = config.store.sqlite_config().ok_or("missing sqlite config")?;
    if sqlite.busy_timeout_ms != 2500 || sqlite.path != Path::new("data/queue.sqlite") {
        return Err(format!("unexpected sqlite config {sqlite:?}"));
    }
    if config.endpoint.catalog_url.as_deref() != Some("http://127.0.0.1:8080/images") {
        return Err("catalog url not loaded".to_string());
    }
    if config.sync.inter_record_delay_ms != 0 || config.sync.periodic_interval_ms != 15_000 {
        return Err("sync section not loaded".to_string());
    }
    if config.logging.sink != LogSinkKind::File {
        return Err("logging sink not loaded".to_string());
    }
    Ok(())
}
