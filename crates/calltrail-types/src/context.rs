//! Per-call invocation context.

use crate::{ArgSnapshot, AuditRecord, CallSite, CallerIdentity, ExecutionStatus, FunctionInfo};
use chrono::{DateTime, Duration, Utc};
use std::time::Instant;

/// Message recorded when a context is finished without an outcome.
const INCOMPLETE_MESSAGE: &str = "invocation did not complete";

/// Everything known about one in-flight call.
///
/// Created at wrapper entry, filled in while the call runs, and consumed by
/// [`finish`](Self::finish). It is owned by a single call and never reused.
#[derive(Debug)]
pub struct InvocationContext {
    function: FunctionInfo,
    args: ArgSnapshot,
    call_site: CallSite,
    identity: CallerIdentity,
    custom_message: Option<String>,
    start_time: DateTime<Utc>,
    started: Instant,
    status: Option<ExecutionStatus>,
    result_repr: Option<String>,
    error_message: Option<String>,
    captured_log_text: String,
}

impl InvocationContext {
    /// Start a new invocation, stamping the start time.
    pub fn begin(function: FunctionInfo, args: ArgSnapshot, call_site: CallSite) -> Self {
        Self {
            function,
            args,
            call_site,
            identity: CallerIdentity::default(),
            custom_message: None,
            start_time: Utc::now(),
            started: Instant::now(),
            status: None,
            result_repr: None,
            error_message: None,
            captured_log_text: String::new(),
        }
    }

    /// Attach the caller identity.
    pub fn with_identity(mut self, identity: CallerIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Attach a caller-supplied annotation.
    pub fn with_custom_message(mut self, message: Option<String>) -> Self {
        self.custom_message = message;
        self
    }

    /// Record a normal return.
    pub fn succeed(&mut self, result_repr: impl Into<String>) {
        self.status = Some(ExecutionStatus::Success);
        self.result_repr = Some(result_repr.into());
        self.error_message = None;
    }

    /// Record a failure.
    pub fn fail(&mut self, error_message: impl Into<String>) {
        self.status = Some(ExecutionStatus::Failure);
        self.result_repr = None;
        self.error_message = Some(error_message.into());
    }

    /// Store the log text captured during the call.
    pub fn set_captured_logs(&mut self, text: String) {
        self.captured_log_text = text;
    }

    /// The wrapped function.
    pub fn function(&self) -> &FunctionInfo {
        &self.function
    }

    /// Arguments the call was made with.
    pub fn args(&self) -> &ArgSnapshot {
        &self.args
    }

    /// Where the call was issued from.
    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }

    /// When the call started.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Outcome so far, if the call has completed.
    pub fn status(&self) -> Option<ExecutionStatus> {
        self.status
    }

    /// Stamp the end time and turn the context into a persistable record.
    ///
    /// The end time is derived from a monotonic clock, so it never precedes
    /// the start time. A context finished without an outcome is recorded as
    /// a failure.
    pub fn finish(self) -> AuditRecord {
        let elapsed = Duration::from_std(self.started.elapsed()).unwrap_or_else(|_| Duration::zero());
        let end_time = self.start_time + elapsed;
        let duration_seconds = elapsed
            .num_microseconds()
            .map(|us| us as f64 / 1_000_000.0)
            .unwrap_or_else(|| elapsed.num_milliseconds() as f64 / 1_000.0);

        let (status, error_message) = match self.status {
            Some(status) => (status, self.error_message),
            None => (
                ExecutionStatus::Failure,
                Some(INCOMPLETE_MESSAGE.to_string()),
            ),
        };

        AuditRecord {
            function_name: self.function.name().to_string(),
            arguments: self.args.to_text(),
            start_time: self.start_time,
            end_time,
            duration_seconds,
            result: self.result_repr,
            status,
            error_message,
            module_name: self.function.module().to_string(),
            hostname: self.identity.hostname,
            ip_address: self.identity.ip_address,
            custom_message: self.custom_message,
            log_messages: self.captured_log_text,
            user_login: self.identity.user_login,
            defined_in_file: self.function.defined_in().to_string(),
            called_from_file: self.call_site.file,
        }
    }
}
