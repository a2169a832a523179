use crate::StoreError;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};

const MEMORY_PATH: &str = ":memory:";

/// Connection settings for the SQLite file behind an audit store.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// SQLite file, or `:memory:`.
    pub database_path: String,
    pub min_connections: u32,
    /// Upper bound on concurrent inserts holding a connection.
    pub max_connections: u32,
    /// How long an insert waits for a free connection.
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
    /// Write-ahead journal, so readers never block the writer.
    pub wal_mode: bool,
    pub synchronous: SynchronousMode,
    /// How long a connection retries while another one holds the write lock.
    pub busy_timeout: Duration,
    pub create_if_missing: bool,
}

/// SQLite `synchronous` pragma.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SynchronousMode {
    Off,
    #[default]
    Normal,
    Full,
}

impl From<SynchronousMode> for SqliteSynchronous {
    fn from(mode: SynchronousMode) -> Self {
        match mode {
            SynchronousMode::Off => SqliteSynchronous::Off,
            SynchronousMode::Normal => SqliteSynchronous::Normal,
            SynchronousMode::Full => SqliteSynchronous::Full,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            database_path: "calltrail.db".to_string(),
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            wal_mode: true,
            synchronous: SynchronousMode::Normal,
            busy_timeout: Duration::from_secs(5),
            create_if_missing: true,
        }
    }
}

impl PoolConfig {
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }

    /// A single long-lived connection to a private in-memory database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to exactly one connection that is never recycled.
    pub fn in_memory() -> Self {
        Self {
            database_path: MEMORY_PATH.to_string(),
            min_connections: 1,
            max_connections: 1,
            idle_timeout: None,
            max_lifetime: None,
            wal_mode: false,
            ..Default::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == MEMORY_PATH
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let problem = if self.max_connections == 0 {
            Some("max_connections must be at least 1")
        } else if self.min_connections > self.max_connections {
            Some("min_connections cannot exceed max_connections")
        } else if self.is_in_memory() && self.max_connections > 1 {
            Some("an in-memory database cannot be shared by more than one connection")
        } else {
            None
        };

        match problem {
            Some(message) => Err(StoreError::InvalidConfig(message.to_string())),
            None => Ok(()),
        }
    }

    fn connect_options(&self) -> Result<SqliteConnectOptions, StoreError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", self.database_path))
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?
            .create_if_missing(self.create_if_missing)
            .busy_timeout(self.busy_timeout)
            .synchronous(self.synchronous.into());

        Ok(if self.wal_mode {
            options.journal_mode(SqliteJournalMode::Wal)
        } else {
            options
        })
    }
}

/// Builder for [`PoolConfig`]; [`build`](Self::build) validates.
#[derive(Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    pub fn database_path(mut self, path: impl Into<String>) -> Self {
        self.config.database_path = path.into();
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.config.min_connections = min;
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.config.max_connections = max;
        self
    }

    pub fn wal_mode(mut self, enabled: bool) -> Self {
        self.config.wal_mode = enabled;
        self
    }

    pub fn synchronous(mut self, mode: SynchronousMode) -> Self {
        self.config.synchronous = mode;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    pub fn build(self) -> Result<PoolConfig, StoreError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// SQLite connection pool shared by every insert into one store.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
    config: PoolConfig,
}

impl DatabasePool {
    /// Open the pool and make sure the database answers.
    #[instrument(skip(config), fields(path = %config.database_path))]
    pub async fn new(config: PoolConfig) -> Result<Self, StoreError> {
        config.validate()?;

        let pool = SqlitePoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect_with(config.connect_options()?)
            .await?;

        let opened = Self { pool, config };
        opened.health_check().await?;

        info!(
            max_connections = opened.config.max_connections,
            wal = opened.config.wal_mode,
            "Audit store database opened"
        );
        Ok(opened)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Round-trip a trivial query.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::HealthCheck(e.to_string()))
    }

    /// Wait for in-flight inserts and close every connection.
    #[instrument(skip(self), fields(path = %self.config.database_path))]
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Audit store database closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
