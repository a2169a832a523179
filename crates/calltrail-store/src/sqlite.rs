//! SQLite-backed audit store.

use crate::{AuditStore, AuditTable, DatabasePool, PoolConfig, StoreError};
use async_trait::async_trait;
use calltrail_types::{AuditRecord, ExecutionStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// Audit store writing one row per record into an SQLite table.
#[derive(Debug, Clone)]
pub struct SqliteAuditStore {
    name: String,
    pool: DatabasePool,
    table: AuditTable,
    insert_sql: String,
}

impl SqliteAuditStore {
    /// Wrap an existing pool.
    pub fn new(name: impl Into<String>, pool: DatabasePool, table: AuditTable) -> Self {
        let insert_sql = table.insert_sql();
        Self {
            name: name.into(),
            pool,
            table,
            insert_sql,
        }
    }

    /// Open a pool from `config` and wrap it.
    pub async fn connect(
        name: impl Into<String>,
        config: PoolConfig,
        table: AuditTable,
    ) -> Result<Self, StoreError> {
        let pool = DatabasePool::new(config).await?;
        Ok(Self::new(name, pool, table))
    }

    /// Create the audit table if it does not exist yet.
    #[instrument(skip(self), fields(store = %self.name, table = %self.table.name()))]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(&self.table.create_sql())
            .execute(self.pool.pool())
            .await?;

        info!("Audit table ready");
        Ok(())
    }

    /// Read every stored record in insertion order.
    pub async fn fetch_all(&self) -> Result<Vec<AuditRecord>, StoreError> {
        let rows = sqlx::query(&self.table.select_sql())
            .fetch_all(self.pool.pool())
            .await?;

        rows.iter().map(decode_record).collect()
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as(&self.table.count_sql())
            .fetch_one(self.pool.pool())
            .await?;
        Ok(count)
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Table records are written to.
    pub fn table(&self) -> &AuditTable {
        &self.table
    }
}

#[async_trait]
impl AuditStore for SqliteAuditStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, record: &AuditRecord) -> Result<(), StoreError> {
        // Dropping the transaction without commit rolls it back, so an error
        // anywhere below leaves no partial row behind.
        let mut tx = self.pool.pool().begin().await?;

        sqlx::query(&self.insert_sql)
            .bind(&record.function_name)
            .bind(&record.arguments)
            .bind(record.start_time)
            .bind(record.end_time)
            .bind(record.duration_seconds)
            .bind(record.result.as_deref())
            .bind(record.status.as_ref())
            .bind(record.error_message.as_deref())
            .bind(&record.module_name)
            .bind(&record.hostname)
            .bind(record.ip_address.as_deref())
            .bind(record.custom_message.as_deref())
            .bind(&record.log_messages)
            .bind(record.user_login.as_deref())
            .bind(&record.defined_in_file)
            .bind(&record.called_from_file)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            store = %self.name,
            function = %record.function_name,
            status = %record.status,
            "Audit record committed"
        );
        Ok(())
    }
}

fn decode_record(row: &SqliteRow) -> Result<AuditRecord, StoreError> {
    let status: String = row.try_get("status")?;
    let status = ExecutionStatus::from_str(&status)
        .map_err(|_| StoreError::CorruptRow(format!("unknown status '{}'", status)))?;

    Ok(AuditRecord {
        function_name: row.try_get("function_name")?,
        arguments: row.try_get("arguments")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        duration_seconds: row.try_get("duration_seconds")?,
        result: row.try_get("result")?,
        status,
        error_message: row.try_get("error_message")?,
        module_name: row.try_get("module_name")?,
        hostname: row.try_get("hostname")?,
        ip_address: row.try_get("ip_address")?,
        custom_message: row.try_get("custom_message")?,
        log_messages: row.try_get("log_messages")?,
        user_login: row.try_get("user_login")?,
        defined_in_file: row.try_get("defined_in_file")?,
        called_from_file: row.try_get("called_from_file")?,
    })
}
