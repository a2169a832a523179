//! Identity and source locations of traced functions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;

/// Static description of a traced function.
///
/// Usually built with [`function_info!`](crate::function_info).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionInfo {
    name: &'static str,
    module: &'static str,
    defined_in: &'static str,
    line: u32,
}

impl FunctionInfo {
    /// Create a new function description.
    pub const fn new(
        name: &'static str,
        module: &'static str,
        defined_in: &'static str,
        line: u32,
    ) -> Self {
        Self {
            name,
            module,
            defined_in,
            line,
        }
    }

    /// Function name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Module path the function lives in.
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// Source file the function is defined in.
    pub fn defined_in(&self) -> &'static str {
        self.defined_in
    }

    /// Line of the definition site.
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for FunctionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

/// Source location a traced call was issued from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Source file of the caller.
    pub file: String,
    /// Line in the caller's file.
    pub line: u32,
    /// Column in the caller's file.
    pub column: u32,
}

impl CallSite {
    /// Create a call site from explicit coordinates.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location of the caller of the `#[track_caller]` function this is
    /// invoked from.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&Location<'_>> for CallSite {
    fn from(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line(), location.column())
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
