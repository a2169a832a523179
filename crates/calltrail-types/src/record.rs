//! The persisted audit row.

use crate::ExecutionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted record describing a single audited invocation.
///
/// Field names match the audit table's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Name of the wrapped function.
    pub function_name: String,
    /// Argument snapshot, `{"args":[...],"kwargs":{...}}`.
    pub arguments: String,
    /// When the call started.
    pub start_time: DateTime<Utc>,
    /// When the call finished.
    pub end_time: DateTime<Utc>,
    /// `end_time - start_time` in seconds.
    pub duration_seconds: f64,
    /// Textual result, absent on failure.
    pub result: Option<String>,
    /// Call outcome.
    pub status: ExecutionStatus,
    /// Failure message, present only on failure.
    pub error_message: Option<String>,
    /// Module path of the wrapped function.
    pub module_name: String,
    /// Host the call ran on.
    pub hostname: String,
    /// Resolved address of the host.
    pub ip_address: Option<String>,
    /// Caller-supplied annotation.
    pub custom_message: Option<String>,
    /// Log lines emitted while the call ran.
    pub log_messages: String,
    /// Operating-system user.
    pub user_login: Option<String>,
    /// File the wrapped function is defined in.
    pub defined_in_file: String,
    /// File the call was issued from.
    pub called_from_file: String,
}

impl AuditRecord {
    /// Check if the recorded call succeeded.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
