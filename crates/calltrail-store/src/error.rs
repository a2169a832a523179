//! Audit store errors.

use thiserror::Error;

/// Errors raised while persisting or reading audit records.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store health check failed: {0}")]
    HealthCheck(String),

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("no audit store registered under '{0}'")]
    UnknownStore(String),

    #[error("audit store '{0}' is unavailable")]
    Unavailable(String),

    #[error("corrupt audit row: {0}")]
    CorruptRow(String),
}
