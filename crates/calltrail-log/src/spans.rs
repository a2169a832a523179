//! Spans and timing for traced calls.

use std::time::{Duration, Instant};
use tracing::{info, info_span, Span};

/// Name of the span opened around every audited call.
pub const AUDITED_CALL: &str = "audited_call";

/// Span for an audited call. Capture buffers bind to it.
pub fn audited_call_span(function: &str, module: &str) -> Span {
    info_span!("audited_call", function = %function, module = %module)
}

/// Span for a call traced without persistence.
pub fn traced_call_span(function: &str, module: &str) -> Span {
    info_span!("traced_call", function = %function, module = %module)
}

/// Wall-clock timer for a single call.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Log the duration in seconds with two decimals and return it.
    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        info!(
            function = %self.operation,
            duration_seconds = elapsed.as_secs_f64(),
            "'{}' finished. Duration: {:.2} seconds",
            self.operation,
            elapsed.as_secs_f64()
        );
        elapsed
    }
}
