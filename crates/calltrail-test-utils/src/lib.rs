//! Test utilities for calltrail crates.

use calltrail_log::LogCapture;
use calltrail_types::{AuditRecord, ExecutionStatus};
use chrono::{Duration, Utc};
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;

/// Creates a temporary directory that is cleaned up on drop.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Path for a fresh SQLite database inside a temporary directory.
pub fn temp_database() -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let path = dir.path().join("audit.db");
    (dir, path)
}

/// A local subscriber carrying only the capture layer of `capture`.
///
/// Install it with `tracing::dispatcher::set_default` or `with_default`
/// so tests never touch the global subscriber.
pub fn capture_dispatch(capture: &LogCapture) -> Dispatch {
    Dispatch::new(tracing_subscriber::registry().with(capture.layer()))
}

/// A fully populated record for store tests.
pub fn sample_record(status: ExecutionStatus) -> AuditRecord {
    let start_time = Utc::now();
    let end_time = start_time + Duration::milliseconds(250);
    let failed = status.is_failure();

    AuditRecord {
        function_name: "add".to_string(),
        arguments: r#"{"args":["2","3"],"kwargs":{}}"#.to_string(),
        start_time,
        end_time,
        duration_seconds: 0.25,
        result: (!failed).then(|| "5".to_string()),
        status,
        error_message: failed.then(|| "bad".to_string()),
        module_name: "billing::totals".to_string(),
        hostname: "build-01".to_string(),
        ip_address: Some("10.0.0.7".to_string()),
        custom_message: Some("nightly reconciliation".to_string()),
        log_messages: "2026-01-01 00:00:00,000 - INFO - summing\n".to_string(),
        user_login: Some("ops".to_string()),
        defined_in_file: "src/totals.rs".to_string(),
        called_from_file: "src/main.rs".to_string(),
    }
}

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a Result is Err and return the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}
