//! Configuration types.

use calltrail_log::{LogConfig, LogFormat, LogLevel};
use calltrail_store::{AuditTable, PoolConfig, DEFAULT_TABLE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ConfigError;

/// Root configuration, read from `.calltrail/config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalltrailConfig {
    /// Process log sink and capture settings.
    pub log: LogSettings,
    /// Audit store connection.
    pub store: StoreSettings,
    /// Audited call behavior.
    pub audit: AuditSettings,
}

/// Log sink settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Minimum level for the process sink.
    pub level: String,
    /// `pretty`, `compact` or `json`.
    pub format: String,
    /// Append-only log file.
    pub file: Option<PathBuf>,
    pub source_location: bool,
    pub span_events: bool,
    /// Minimum level of lines captured into audit records.
    pub capture_level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
            source_location: false,
            span_events: false,
            capture_level: "info".to_string(),
        }
    }
}

impl LogSettings {
    pub fn to_log_config(&self) -> Result<LogConfig, ConfigError> {
        Ok(LogConfig {
            level: parse_level("log.level", &self.level)?,
            format: LogFormat::parse(&self.format).ok_or_else(|| ConfigError::ValidationError {
                message: format!("log.format '{}' is not one of pretty, compact, json", self.format),
            })?,
            file_path: self.file.clone(),
            source_location: self.source_location,
            span_events: self.span_events,
            capture_level: parse_level("log.capture_level", &self.capture_level)?,
        })
    }
}

fn parse_level(field: &str, value: &str) -> Result<LogLevel, ConfigError> {
    LogLevel::parse(value).ok_or_else(|| ConfigError::ValidationError {
        message: format!("{} '{}' is not a known log level", field, value),
    })
}

/// Audit store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Logical store name records are attributed to.
    pub name: String,
    /// SQLite file, or `:memory:`.
    pub database_path: String,
    pub table: String,
    pub max_connections: u32,
    pub create_if_missing: bool,
    pub wal_mode: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            database_path: "calltrail.db".to_string(),
            table: DEFAULT_TABLE.to_string(),
            max_connections: 5,
            create_if_missing: true,
            wal_mode: true,
        }
    }
}

impl StoreSettings {
    pub fn to_pool_config(&self) -> Result<PoolConfig, ConfigError> {
        if self.database_path == ":memory:" {
            return Ok(PoolConfig::in_memory());
        }

        PoolConfig::builder()
            .database_path(self.database_path.clone())
            .min_connections(1)
            .max_connections(self.max_connections)
            .create_if_missing(self.create_if_missing)
            .wal_mode(self.wal_mode)
            .build()
            .map_err(|e| ConfigError::ValidationError {
                message: format!("store: {}", e),
            })
    }

    pub fn audit_table(&self) -> Result<AuditTable, ConfigError> {
        AuditTable::new(self.table.clone()).map_err(|e| ConfigError::ValidationError {
            message: format!("store.table: {}", e),
        })
    }
}

/// Audited call settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Free text stored with every record.
    pub custom_message: Option<String>,
    /// Persist successful calls, not only failures.
    pub log_on_success: bool,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            custom_message: None,
            log_on_success: true,
        }
    }
}
