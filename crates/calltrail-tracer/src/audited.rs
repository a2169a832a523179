//! Audited calls: traced, captured and persisted as one audit row.

use crate::identity::{IdentityResolver, SystemIdentity};
use crate::tracer::observe_async;
use crate::{PersistFailure, TracerError};
use calltrail_config::{AuditSettings, CalltrailConfig, StoreSettings};
use calltrail_log::spans::audited_call_span;
use calltrail_log::LogCapture;
use calltrail_store::{AuditStore, SqliteAuditStore, StoreError, StoreRegistry};
use calltrail_types::{
    AuditRecord, CallArgs, CallSite, ExecutionStatus, FunctionInfo, InvocationContext,
};
use std::fmt::{self, Debug, Display};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// Per-tracer audit behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConfig {
    /// Annotation stored with every record.
    pub custom_message: Option<String>,
    /// Persist successful calls. Failures are always persisted.
    pub log_on_success: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            custom_message: None,
            log_on_success: true,
        }
    }
}

impl AuditConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn custom_message(mut self, message: impl Into<String>) -> Self {
        self.custom_message = Some(message.into());
        self
    }

    pub fn log_on_success(mut self, enabled: bool) -> Self {
        self.log_on_success = enabled;
        self
    }

    /// Whether a call that ended with `status` gets a row.
    pub fn should_persist(&self, status: ExecutionStatus) -> bool {
        self.log_on_success || status.is_failure()
    }
}

impl From<&AuditSettings> for AuditConfig {
    fn from(settings: &AuditSettings) -> Self {
        Self {
            custom_message: settings.custom_message.clone(),
            log_on_success: settings.log_on_success,
        }
    }
}

/// Open the SQLite store described by `settings` and provision its table.
pub async fn open_store(settings: &StoreSettings) -> Result<SqliteAuditStore, TracerError> {
    let store = SqliteAuditStore::connect(
        settings.name.clone(),
        settings.to_pool_config()?,
        settings.audit_table()?,
    )
    .await?;
    store.ensure_schema().await?;
    Ok(store)
}

/// Factory for audited wrappers sharing one store, capture handle and identity.
#[derive(Clone)]
pub struct AuditedExecutionTracer {
    store: Arc<dyn AuditStore>,
    capture: LogCapture,
    identity: Arc<dyn IdentityResolver>,
    config: AuditConfig,
}

impl AuditedExecutionTracer {
    pub fn builder() -> AuditedExecutionTracerBuilder {
        AuditedExecutionTracerBuilder::default()
    }

    /// Build from loaded configuration, resolving the store by its logical name.
    pub fn from_config(
        config: &CalltrailConfig,
        stores: &StoreRegistry,
        capture: LogCapture,
    ) -> Result<Self, TracerError> {
        Self::builder()
            .store(stores.get(&config.store.name)?)
            .capture(capture)
            .config(AuditConfig::from(&config.audit))
            .build()
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    /// Bind `f` to its description.
    pub fn wrap<F>(&self, info: FunctionInfo, f: F) -> Audited<F> {
        Audited {
            tracer: self.clone(),
            info,
            f,
        }
    }

    async fn persist(&self, record: &AuditRecord) -> Result<(), StoreError> {
        match self.store.insert(record).await {
            Ok(()) => {
                info!(
                    "execution log for '{}' recorded in audit store '{}'",
                    record.function_name,
                    self.store.name()
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    status = %record.status,
                    "execution log for '{}' could not be recorded in audit store '{}': {}",
                    record.function_name,
                    self.store.name(),
                    e
                );
                Err(e)
            }
        }
    }
}

impl fmt::Debug for AuditedExecutionTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditedExecutionTracer")
            .field("store", &self.store.name())
            .field("capture", &self.capture)
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Default)]
pub struct AuditedExecutionTracerBuilder {
    store: Option<Arc<dyn AuditStore>>,
    capture: Option<LogCapture>,
    identity: Option<Arc<dyn IdentityResolver>>,
    config: AuditConfig,
}

impl AuditedExecutionTracerBuilder {
    pub fn store(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn capture(mut self, capture: LogCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Defaults to [`SystemIdentity`].
    pub fn identity(mut self, identity: impl IdentityResolver + 'static) -> Self {
        self.identity = Some(Arc::new(identity));
        self
    }

    pub fn config(mut self, config: AuditConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<AuditedExecutionTracer, TracerError> {
        let identity: Arc<dyn IdentityResolver> = match self.identity {
            Some(identity) => identity,
            None => Arc::new(SystemIdentity::new()),
        };

        Ok(AuditedExecutionTracer {
            store: self.store.ok_or(TracerError::MissingStore)?,
            capture: self.capture.ok_or(TracerError::MissingCapture)?,
            identity,
            config: self.config,
        })
    }
}

/// A function bound to an [`AuditedExecutionTracer`].
///
/// Every call resolves once the inner call has finished and its audit row,
/// if any, has been committed. The inner outcome is returned as is.
#[derive(Clone)]
pub struct Audited<F> {
    tracer: AuditedExecutionTracer,
    info: FunctionInfo,
    f: F,
}

impl<F> Audited<F> {
    pub fn info(&self) -> &FunctionInfo {
        &self.info
    }

    /// Run a synchronous inner call. A store failure is logged, not returned.
    #[track_caller]
    pub fn call<'a, A, T, E>(&'a self, args: A) -> impl Future<Output = Result<T, E>> + 'a
    where
        A: CallArgs + 'a,
        T: Debug + 'a,
        E: Display + Debug + 'a,
        F: Fn(A) -> Result<T, E>,
    {
        let call_site = CallSite::caller();
        async move {
            let f = &self.f;
            let (outcome, _) = self
                .execute(call_site, args, move |a| async move { f(a) })
                .await;
            outcome
        }
    }

    /// Run an inner call returning a future. A store failure is logged, not returned.
    #[track_caller]
    pub fn call_async<'a, A, T, E, Fut>(
        &'a self,
        args: A,
    ) -> impl Future<Output = Result<T, E>> + 'a
    where
        A: CallArgs + 'a,
        T: Debug + 'a,
        E: Display + Debug + 'a,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>> + 'a,
    {
        let call_site = CallSite::caller();
        async move {
            let (outcome, _) = self.execute(call_site, args, &self.f).await;
            outcome
        }
    }

    /// Like [`call`](Self::call), but a store failure is returned together
    /// with the inner outcome.
    #[track_caller]
    pub fn call_checked<'a, A, T, E>(
        &'a self,
        args: A,
    ) -> impl Future<Output = Result<Result<T, E>, PersistFailure<T, E>>> + 'a
    where
        A: CallArgs + 'a,
        T: Debug + 'a,
        E: Display + Debug + 'a,
        F: Fn(A) -> Result<T, E>,
    {
        let call_site = CallSite::caller();
        async move {
            let f = &self.f;
            let (outcome, persisted) = self
                .execute(call_site, args, move |a| async move { f(a) })
                .await;
            checked(outcome, persisted)
        }
    }

    /// Like [`call_async`](Self::call_async), but a store failure is returned
    /// together with the inner outcome.
    #[track_caller]
    pub fn call_async_checked<'a, A, T, E, Fut>(
        &'a self,
        args: A,
    ) -> impl Future<Output = Result<Result<T, E>, PersistFailure<T, E>>> + 'a
    where
        A: CallArgs + 'a,
        T: Debug + 'a,
        E: Display + Debug + 'a,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>> + 'a,
    {
        let call_site = CallSite::caller();
        async move {
            let (outcome, persisted) = self.execute(call_site, args, &self.f).await;
            checked(outcome, persisted)
        }
    }

    async fn execute<A, T, E, Fut>(
        &self,
        call_site: CallSite,
        args: A,
        invoke: impl FnOnce(A) -> Fut,
    ) -> (Result<T, E>, Result<(), StoreError>)
    where
        A: CallArgs,
        T: Debug,
        E: Display + Debug,
        Fut: Future<Output = Result<T, E>>,
    {
        let tracer = &self.tracer;
        let mut context = InvocationContext::begin(self.info, args.snapshot(), call_site)
            .with_identity(tracer.identity.resolve())
            .with_custom_message(tracer.config.custom_message.clone());

        let span = audited_call_span(self.info.name(), self.info.module());
        let capture = tracer.capture.begin(&span);

        let outcome = observe_async(&self.info, context.args(), || invoke(args))
            .instrument(span.clone())
            .await;

        match &outcome {
            Ok(value) => context.succeed(format!("{:?}", value)),
            Err(e) => context.fail(e.to_string()),
        }
        context.set_captured_logs(capture.finish());
        drop(span);

        let record = context.finish();
        let persisted = if tracer.config.should_persist(record.status) {
            tracer.persist(&record).await
        } else {
            Ok(())
        };

        (outcome, persisted)
    }
}

impl<F> fmt::Debug for Audited<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Audited")
            .field("info", &self.info)
            .field("tracer", &self.tracer)
            .finish()
    }
}

fn checked<T, E>(
    outcome: Result<T, E>,
    persisted: Result<(), StoreError>,
) -> Result<Result<T, E>, PersistFailure<T, E>> {
    match persisted {
        Ok(()) => Ok(outcome),
        Err(source) => Err(PersistFailure { source, outcome }),
    }
}
