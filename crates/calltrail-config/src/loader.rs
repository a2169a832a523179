//! Configuration file loading and parsing.

use crate::env::{self, vars};
use crate::types::CalltrailConfig;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Directory holding the config file, relative to the project root.
pub const CONFIG_DIR: &str = ".calltrail";
/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.yaml";

static ENV_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env reference pattern is valid")
});

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base_path: PathBuf,
    explicit_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader for `<project_dir>/.calltrail/config.yaml`.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
            explicit_path: None,
        }
    }

    /// Loader for the current directory after reading `.env` files.
    ///
    /// `CALLTRAIL_CONFIG_PATH` names the config file directly when set.
    pub fn from_env() -> Self {
        env::load_dotenv();

        let loader = Self::default();
        match env::get(vars::CALLTRAIL_CONFIG_PATH) {
            Some(path) => loader.with_path(path),
            None => loader,
        }
    }

    /// Read this exact file instead of the project default.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.explicit_path
            .clone()
            .unwrap_or_else(|| self.base_path.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the config file, falling back to defaults when the project has none.
    ///
    /// A path given through [`with_path`](Self::with_path) must exist.
    pub fn load(&self) -> Result<CalltrailConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            if self.explicit_path.is_some() {
                return Err(ConfigError::NotFound { path: config_path });
            }
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(CalltrailConfig::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let expanded = expand_env_vars(&contents)?;

        let config: CalltrailConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        validate(&config)?;
        debug!(path = %config_path.display(), "Loaded config");
        Ok(config)
    }

    /// Write `config` as YAML to [`config_path`](Self::config_path).
    pub fn save(&self, config: &CalltrailConfig) -> Result<(), ConfigError> {
        let config_path = self.config_path();
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(config_path, yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references.
pub fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut missing = None;

    let expanded = ENV_REF.replace_all(content, |cap: &Captures<'_>| {
        let var = &cap[1];
        match (std::env::var(var), cap.get(2)) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => {
                missing.get_or_insert_with(|| var.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var) => Err(ConfigError::EnvVarNotFound { var }),
        None => Ok(expanded.into_owned()),
    }
}

/// Check values serde cannot check on its own.
pub fn validate(config: &CalltrailConfig) -> Result<(), ConfigError> {
    config.log.to_log_config()?;

    if config.store.name.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            message: "store.name must not be empty".to_string(),
        });
    }

    if config.store.max_connections == 0 {
        return Err(ConfigError::ValidationError {
            message: "store.max_connections must be at least 1".to_string(),
        });
    }

    config.store.audit_table()?;
    config.store.to_pool_config()?;

    Ok(())
}
