//! Log-only execution tracing.

use calltrail_log::spans::{traced_call_span, Timer};
use calltrail_types::{ArgSnapshot, CallArgs, FunctionInfo};
use std::fmt::{Debug, Display};
use std::future::Future;
use tracing::{error, info, Instrument};

/// Wraps calls with entry, result, error and duration log lines.
///
/// Outcomes pass through untouched: an `Err` from the inner call is logged
/// and handed back as the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionTracer;

impl ExecutionTracer {
    /// Bind `f` to its description for repeated traced calls.
    pub fn wrap<F>(info: FunctionInfo, f: F) -> Traced<F> {
        Traced { info, f }
    }

    /// Trace a single synchronous call.
    pub fn run<A, T, E, F>(info: &FunctionInfo, args: A, f: F) -> Result<T, E>
    where
        A: CallArgs,
        T: Debug,
        E: Display + Debug,
        F: FnOnce(A) -> Result<T, E>,
    {
        let span = traced_call_span(info.name(), info.module());
        let snapshot = args.snapshot();
        span.in_scope(|| observe(info, &snapshot, || f(args)))
    }

    /// Trace a single call whose work is a future.
    pub async fn run_async<A, T, E, F, Fut>(info: &FunctionInfo, args: A, f: F) -> Result<T, E>
    where
        A: CallArgs,
        T: Debug,
        E: Display + Debug,
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let span = traced_call_span(info.name(), info.module());
        let snapshot = args.snapshot();
        observe_async(info, &snapshot, || f(args))
            .instrument(span)
            .await
    }
}

/// A function bound to an [`ExecutionTracer`].
#[derive(Clone)]
pub struct Traced<F> {
    info: FunctionInfo,
    f: F,
}

impl<F> Traced<F> {
    pub fn info(&self) -> &FunctionInfo {
        &self.info
    }

    pub fn call<A, T, E>(&self, args: A) -> Result<T, E>
    where
        A: CallArgs,
        T: Debug,
        E: Display + Debug,
        F: Fn(A) -> Result<T, E>,
    {
        ExecutionTracer::run(&self.info, args, &self.f)
    }

    pub async fn call_async<A, T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        A: CallArgs,
        T: Debug,
        E: Display + Debug,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        ExecutionTracer::run_async(&self.info, args, &self.f).await
    }
}

impl<F> std::fmt::Debug for Traced<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traced").field("info", &self.info).finish()
    }
}

pub(crate) fn observe<T, E>(
    info: &FunctionInfo,
    args: &ArgSnapshot,
    call: impl FnOnce() -> Result<T, E>,
) -> Result<T, E>
where
    T: Debug,
    E: Display + Debug,
{
    log_entry(info, args);
    let timer = Timer::start(info.name());
    let outcome = call();
    log_outcome(info, &outcome);
    timer.finish();
    outcome
}

pub(crate) async fn observe_async<T, E, Fut>(
    info: &FunctionInfo,
    args: &ArgSnapshot,
    call: impl FnOnce() -> Fut,
) -> Result<T, E>
where
    T: Debug,
    E: Display + Debug,
    Fut: Future<Output = Result<T, E>>,
{
    log_entry(info, args);
    let timer = Timer::start(info.name());
    let outcome = call().await;
    log_outcome(info, &outcome);
    timer.finish();
    outcome
}

fn log_entry(info: &FunctionInfo, args: &ArgSnapshot) {
    info!("Executing '{}' | Arguments: {}", info.name(), args.to_text());
}

fn log_outcome<T: Debug, E: Display + Debug>(info: &FunctionInfo, outcome: &Result<T, E>) {
    match outcome {
        Ok(value) => info!("'{}' executed successfully. Result: {:?}", info.name(), value),
        // Display is the message, Debug carries the cause chain.
        Err(e) => error!("Error executing '{}': {}\n{:?}", info.name(), e, e),
    }
}
