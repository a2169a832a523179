//! Capture behind the process-wide subscriber installed by `init`.

use calltrail_log::spans::audited_call_span;
use calltrail_log::{init, LogConfig, LogLevel};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// A value whose Debug output logs a line of its own.
struct Chatty;

impl fmt::Debug for Chatty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        info!("formatting chatty value");
        f.write_str("Chatty")
    }
}

#[test]
fn logging_debug_values_under_contention() {
    let capture = init(LogConfig {
        level: LogLevel::Error,
        ..Default::default()
    })
    .unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let churn = {
        let capture = capture.clone();
        let stop = stop.clone();
        std::thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let span = audited_call_span("churn", module_path!());
                drop(capture.begin(&span));
            }
        })
    };

    for round in 0..200 {
        let span = audited_call_span("report", module_path!());
        let guard = capture.begin(&span);
        span.in_scope(|| info!(value = ?Chatty, round, "reporting"));

        let text = guard.finish();
        assert!(text.contains(" - INFO - formatting chatty value\n"));
        assert!(text.contains(&format!(" - INFO - reporting value=Chatty round={}\n", round)));
    }

    stop.store(true, Ordering::Relaxed);
    churn.join().unwrap();
    assert_eq!(capture.active_captures(), 0);
}
