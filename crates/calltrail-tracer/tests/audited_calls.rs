use calltrail_log::{LogCapture, LogConfig, LogLevel};
use calltrail_store::MemoryAuditStore;
use calltrail_test_utils::{assert_err, assert_ok, capture_dispatch};
use chrono::{Duration, NaiveDateTime};
use calltrail_tracer::{AuditConfig, AuditedExecutionTracer, StaticIdentity};
use calltrail_types::{function_info, CallerIdentity, ExecutionStatus};
use proptest::prelude::*;
use std::sync::Arc;

fn audited(store: &Arc<MemoryAuditStore>, capture: &LogCapture, config: AuditConfig) -> AuditedExecutionTracer {
    AuditedExecutionTracer::builder()
        .store(store.clone())
        .capture(capture.clone())
        .identity(StaticIdentity(CallerIdentity::new("test-host")))
        .config(config)
        .build()
        .unwrap()
}

fn add((a, b): (i64, i64)) -> Result<i64, String> {
    tracing::info!("adding {} and {}", a, b);
    Ok(a + b)
}

fn fail(_: ()) -> Result<i64, anyhow::Error> {
    Err(anyhow::anyhow!("bad"))
}

#[tokio::test]
async fn add_records_one_success_row() {
    let capture = LogCapture::new();
    let _default = tracing::dispatcher::set_default(&capture_dispatch(&capture));
    let store = Arc::new(MemoryAuditStore::default());

    let add = audited(&store, &capture, AuditConfig::default()).wrap(function_info!(add), add);
    assert_eq!(assert_ok!(add.call((2, 3)).await), 5);

    let records = store.records();
    assert_eq!(records.len(), 1);
    let row = &records[0];
    assert_eq!(row.status, ExecutionStatus::Success);
    assert_eq!(row.result.as_deref(), Some("5"));
    assert!(row.error_message.is_none());
    assert!(row.arguments.contains("\"2\""));
    assert!(row.arguments.contains("\"3\""));
    assert!(row.log_messages.contains(" - INFO - adding 2 and 3\n"));
    assert_eq!(row.function_name, "add");
}

#[tokio::test]
async fn fail_records_one_failure_row_then_returns_error() {
    let capture = LogCapture::new();
    let _default = tracing::dispatcher::set_default(&capture_dispatch(&capture));
    let store = Arc::new(MemoryAuditStore::default());

    let fail = audited(&store, &capture, AuditConfig::default()).wrap(function_info!(fail), fail);
    let error = assert_err!(fail.call(()).await);
    assert_eq!(error.to_string(), "bad");

    let records = store.records();
    assert_eq!(records.len(), 1);
    let row = &records[0];
    assert_eq!(row.status, ExecutionStatus::Failure);
    assert_eq!(row.error_message.as_deref(), Some("bad"));
    assert!(row.result.is_none());
    assert!(row.log_messages.contains(" - ERROR - Error executing 'fail': bad"));
}

#[tokio::test]
async fn success_rows_follow_log_on_success() {
    let capture = LogCapture::new();
    let store = Arc::new(MemoryAuditStore::default());

    let quiet = audited(&store, &capture, AuditConfig::new().log_on_success(false));
    let add_quiet = quiet.wrap(function_info!(add), add);
    let fail_quiet = quiet.wrap(function_info!(fail), fail);

    assert_ok!(add_quiet.call((1, 1)).await);
    assert_eq!(store.len(), 0);
    assert_err!(fail_quiet.call(()).await);
    assert_eq!(store.len(), 1);

    store.clear();
    let loud = audited(&store, &capture, AuditConfig::default());
    assert_ok!(loud.wrap(function_info!(add), add).call((1, 1)).await);
    assert_err!(loud.wrap(function_info!(fail), fail).call(()).await);

    let statuses: Vec<_> = store.records().iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![ExecutionStatus::Success, ExecutionStatus::Failure]);
}

fn fail_loudly(_: ()) -> Result<i64, String> {
    tracing::info!("checking balances");
    tracing::warn!("about to fail");
    Err("bad".to_string())
}

#[tokio::test]
async fn capture_level_above_info_still_records_warnings_and_errors() {
    let config = LogConfig {
        capture_level: LogLevel::Warn,
        ..Default::default()
    };
    let (subscriber, capture) = calltrail_log::subscriber(&config).unwrap();
    let _default = tracing::subscriber::set_default(subscriber);
    let store = Arc::new(MemoryAuditStore::default());

    let fail = audited(&store, &capture, AuditConfig::default())
        .wrap(function_info!(fail_loudly), fail_loudly);
    assert_err!(fail.call(()).await);

    let row = store.records().remove(0);
    assert!(row.log_messages.contains(" - WARN - about to fail\n"));
    assert!(row.log_messages.contains(" - ERROR - Error executing 'fail_loudly': bad"));
    assert!(!row.log_messages.contains("checking balances"));
}

#[tokio::test]
async fn captured_lines_share_the_row_time_zone() {
    let capture = LogCapture::new();
    let _default = tracing::dispatcher::set_default(&capture_dispatch(&capture));
    let store = Arc::new(MemoryAuditStore::default());

    let add = audited(&store, &capture, AuditConfig::default()).wrap(function_info!(add), add);
    assert_ok!(add.call((7, 8)).await);

    let row = store.records().remove(0);
    for line in row.log_messages.lines() {
        let stamp = NaiveDateTime::parse_from_str(&line[..23], "%Y-%m-%d %H:%M:%S,%3f")
            .unwrap()
            .and_utc();
        assert!(stamp >= row.start_time - Duration::milliseconds(1), "{}", line);
        assert!(stamp <= row.end_time + Duration::milliseconds(5), "{}", line);
    }
}

#[tokio::test]
async fn duration_matches_timestamps() {
    let capture = LogCapture::new();
    let store = Arc::new(MemoryAuditStore::default());

    let nap = audited(&store, &capture, AuditConfig::default()).wrap(
        function_info!("nap"),
        |(ms,): (u64,)| async move {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
            Ok::<_, String>(ms)
        },
    );
    nap.call_async((15,)).await.unwrap();

    let row = store.records().remove(0);
    assert!(row.end_time >= row.start_time);
    let elapsed = (row.end_time - row.start_time).num_microseconds().unwrap() as f64 / 1_000_000.0;
    assert_eq!(row.duration_seconds, elapsed);
    assert!(row.duration_seconds >= 0.015);
}

#[tokio::test]
async fn panic_releases_capture_and_writes_nothing() {
    let capture = LogCapture::new();
    let _default = tracing::dispatcher::set_default(&capture_dispatch(&capture));
    let store = Arc::new(MemoryAuditStore::default());

    let boom = audited(&store, &capture, AuditConfig::default())
        .wrap(function_info!("boom"), |()| -> Result<(), String> { panic!("boom") });

    let handle = tokio::spawn(async move { boom.call(()).await });
    assert!(handle.await.unwrap_err().is_panic());

    assert_eq!(capture.active_captures(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn nested_audited_calls_each_get_a_row() {
    let capture = LogCapture::new();
    let _default = tracing::dispatcher::set_default(&capture_dispatch(&capture));
    let store = Arc::new(MemoryAuditStore::default());
    let tracer = audited(&store, &capture, AuditConfig::default());

    let inner = Arc::new(tracer.wrap(function_info!(add), add));
    let outer = tracer.wrap(function_info!("total"), move |(n,): (i64,)| {
        let inner = inner.clone();
        async move {
            tracing::info!("totalling");
            inner.call((n, n)).await
        }
    });

    assert_eq!(outer.call_async((4,)).await, Ok(8));

    let records = store.records();
    assert_eq!(records.len(), 2);
    let (inner_row, outer_row) = (&records[0], &records[1]);
    assert_eq!(inner_row.function_name, "add");
    assert!(!inner_row.log_messages.contains("totalling"));
    assert!(outer_row.log_messages.contains("totalling"));
    assert!(outer_row.log_messages.contains("adding 4 and 4"));
}

proptest! {
    #[test]
    fn audited_call_is_transparent(a in any::<i32>(), b in any::<i32>(), message in "[a-z]{1,12}") {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let capture = LogCapture::new();
        let store = Arc::new(MemoryAuditStore::default());
        let tracer = audited(&store, &capture, AuditConfig::default());

        let sum = tracer.wrap(function_info!(add), add);
        let got = runtime.block_on(sum.call((a as i64, b as i64)));
        prop_assert_eq!(got, add((a as i64, b as i64)));

        let reject = {
            let message = message.clone();
            move |()| Err::<(), String>(message.clone())
        };
        let refuse = tracer.wrap(function_info!("refuse"), reject);
        let got = runtime.block_on(refuse.call(()));
        prop_assert_eq!(got, Err(message.clone()));

        let rows = store.records();
        prop_assert_eq!(rows.len(), 2);
        prop_assert_eq!(rows[1].error_message.as_deref(), Some(message.as_str()));
    }
}
