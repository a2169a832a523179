//! Audit table layout and the statements that target it.

use crate::StoreError;

/// Default audit table name.
pub const DEFAULT_TABLE: &str = "execution_logs";

/// Persisted columns, in insert order.
pub const COLUMNS: [&str; 16] = [
    "function_name",
    "arguments",
    "start_time",
    "end_time",
    "duration_seconds",
    "result",
    "status",
    "error_message",
    "module_name",
    "hostname",
    "ip_address",
    "custom_message",
    "log_messages",
    "user_login",
    "defined_in_file",
    "called_from_file",
];

/// A validated audit table name.
///
/// The name is spliced into SQL text, so only plain identifiers are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTable(String);

impl AuditTable {
    pub fn new(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        let mut chars = name.chars();
        let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid {
            return Err(StoreError::InvalidConfig(format!(
                "'{}' is not a valid table name",
                name
            )));
        }

        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn create_sql(&self) -> String {
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                function_name TEXT NOT NULL,
                arguments TEXT NOT NULL,
                start_time DATETIME NOT NULL,
                end_time DATETIME NOT NULL,
                duration_seconds REAL NOT NULL,
                result TEXT,
                status TEXT NOT NULL CHECK (status IN ('SUCCESS', 'FAILURE')),
                error_message TEXT,
                module_name TEXT NOT NULL,
                hostname TEXT NOT NULL,
                ip_address TEXT,
                custom_message TEXT,
                log_messages TEXT NOT NULL,
                user_login TEXT,
                defined_in_file TEXT NOT NULL,
                called_from_file TEXT NOT NULL
            )
            "#,
            self.0
        )
    }

    pub fn insert_sql(&self) -> String {
        let placeholders = vec!["?"; COLUMNS.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.0,
            COLUMNS.join(", "),
            placeholders
        )
    }

    pub fn select_sql(&self) -> String {
        format!("SELECT {} FROM {} ORDER BY id", COLUMNS.join(", "), self.0)
    }

    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.0)
    }
}

impl Default for AuditTable {
    fn default() -> Self {
        Self(DEFAULT_TABLE.to_string())
    }
}
