//! Concurrent audited calls on a multi-threaded runtime and on plain threads.

use calltrail_log::LogCapture;
use calltrail_store::MemoryAuditStore;
use calltrail_test_utils::capture_dispatch;
use calltrail_tracer::{AuditConfig, AuditedExecutionTracer, StaticIdentity};
use calltrail_types::{function_info, CallerIdentity};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;

// Worker threads need a global subscriber; each test binary installs it once.
static CAPTURE: Lazy<LogCapture> = Lazy::new(|| {
    let capture = LogCapture::new();
    tracing::dispatcher::set_global_default(capture_dispatch(&capture))
        .expect("no other global subscriber in this test binary");
    capture
});

fn tracer(store: &Arc<MemoryAuditStore>) -> AuditedExecutionTracer {
    AuditedExecutionTracer::builder()
        .store(store.clone())
        .capture(CAPTURE.clone())
        .identity(StaticIdentity(CallerIdentity::new("test-host")))
        .config(AuditConfig::default())
        .build()
        .unwrap()
}

async fn chatter(marker: &'static str) -> Result<(), String> {
    for round in 0..5 {
        tracing::info!("{} round {}", marker, round);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_capture_only_their_own_lines() {
    let store = Arc::new(MemoryAuditStore::default());
    let tracer = tracer(&store);

    let alpha = Arc::new(tracer.wrap(function_info!("alpha"), |()| chatter("ALPHA-MARKER")));
    let beta = Arc::new(tracer.wrap(function_info!("beta"), |()| chatter("BETA-MARKER")));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let alpha = alpha.clone();
        handles.push(tokio::spawn(async move { alpha.call_async(()).await }));
        let beta = beta.clone();
        handles.push(tokio::spawn(async move { beta.call_async(()).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let records = store.records();
    assert_eq!(records.len(), 16);
    for record in records {
        let (own, other) = match record.function_name.as_str() {
            "alpha" => ("ALPHA-MARKER", "BETA-MARKER"),
            "beta" => ("BETA-MARKER", "ALPHA-MARKER"),
            name => panic!("unexpected function {}", name),
        };
        assert_eq!(record.log_messages.matches(own).count(), 5);
        assert!(!record.log_messages.contains(other));
    }
}

#[test]
fn concurrent_threads_capture_only_their_own_lines() {
    let store = Arc::new(MemoryAuditStore::default());
    let tracer = tracer(&store);

    let workers: Vec<_> = ["LEFT", "RIGHT", "UP", "DOWN"]
        .into_iter()
        .map(|marker| {
            let tracer = tracer.clone();
            std::thread::spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                let work = tracer.wrap(function_info!("work"), move |(n,): (u32,)| {
                    for i in 0..n {
                        tracing::info!("{}-{}", marker, i);
                        std::thread::sleep(Duration::from_millis(1));
                    }
                    Ok::<_, String>(marker)
                });
                runtime.block_on(work.call((10,))).unwrap()
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let records = store.records();
    assert_eq!(records.len(), 4);
    for record in records {
        let marker = record.result.unwrap();
        let marker = marker.trim_matches('"');
        for i in 0..10 {
            assert!(record.log_messages.contains(&format!("{}-{}\n", marker, i)));
        }
        for other in ["LEFT", "RIGHT", "UP", "DOWN"].iter().filter(|m| **m != marker) {
            assert!(!record.log_messages.contains(&format!("{}-", other)));
        }
    }
}
