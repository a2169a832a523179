use calltrail_config::ConfigError;
use calltrail_store::StoreError;
use std::fmt;
use thiserror::Error;

/// Errors building an audited tracer.
#[derive(Debug, Error)]
pub enum TracerError {
    #[error("no audit store configured")]
    MissingStore,

    #[error("no log capture configured")]
    MissingCapture,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// The audit row for a call could not be written.
///
/// `outcome` is exactly what the inner call returned, so nothing about the
/// call itself is lost when the store fails.
#[derive(Debug)]
pub struct PersistFailure<T, E> {
    pub source: StoreError,
    pub outcome: Result<T, E>,
}

impl<T, E> PersistFailure<T, E> {
    /// Give up on the audit guarantee and keep the call's own outcome.
    pub fn into_outcome(self) -> Result<T, E> {
        self.outcome
    }
}

impl<T, E> fmt::Display for PersistFailure<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "execution log could not be recorded: {}", self.source)
    }
}

impl<T: fmt::Debug, E: fmt::Debug> std::error::Error for PersistFailure<T, E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
