//! Configuration for calltrail.
//!
//! Settings live in `.calltrail/config.yaml` (or the file named by
//! `CALLTRAIL_CONFIG_PATH`). Values may reference the environment with
//! `${VAR}` or `${VAR:-default}`, and every section falls back to defaults.

pub mod env;
pub mod loader;
pub mod types;

pub use loader::{expand_env_vars, validate, ConfigError, ConfigLoader, CONFIG_DIR, CONFIG_FILE};
pub use types::{AuditSettings, CalltrailConfig, LogSettings, StoreSettings};
