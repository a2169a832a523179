//! Execution outcome of a traced call.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Whether the wrapped call returned normally or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// The call returned `Ok`.
    Success,
    /// The call returned `Err`.
    Failure,
}

impl ExecutionStatus {
    /// Check if the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Check if the call failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }
}
