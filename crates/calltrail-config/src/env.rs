//! Environment variable handling.

use std::env;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable names.
pub mod vars {
    pub const CALLTRAIL_CONFIG_PATH: &str = "CALLTRAIL_CONFIG_PATH";
}

/// Load `.env` then `.env.local` from the current directory.
///
/// Variables already set in the process win. Returns the files that were read.
pub fn load_dotenv() -> Vec<PathBuf> {
    [".env", ".env.local"]
        .into_iter()
        .filter_map(|name| match dotenvy::from_filename(name) {
            Ok(path) => Some(path),
            Err(e) => {
                if !e.not_found() {
                    debug!(file = name, error = %e, "Skipping unreadable env file");
                }
                None
            }
        })
        .collect()
}

/// Get an optional, non-empty variable.
pub fn get(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}
