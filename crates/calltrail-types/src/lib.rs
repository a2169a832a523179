//! Invocation and audit record types for calltrail.
//!
//! These types describe a single traced call: what was called, with which
//! arguments, from where, by whom, and how it ended. An [`InvocationContext`]
//! is filled in progressively while the call runs and is consumed into an
//! [`AuditRecord`], the row persisted by the audit store.

mod args;
mod context;
mod function;
mod identity;
mod record;
mod status;

pub use args::{ArgSnapshot, CallArgs};
pub use context::InvocationContext;
pub use function::{CallSite, FunctionInfo};
pub use identity::CallerIdentity;
pub use record::AuditRecord;
pub use status::ExecutionStatus;

/// Describe a function for tracing, capturing its module path and the file
/// and line where the macro is expanded.
///
/// Expand it next to the function definition so `defined_in` points there:
///
/// ```
/// use calltrail_types::{function_info, FunctionInfo};
///
/// fn add(a: i32, b: i32) -> i32 {
///     a + b
/// }
/// const ADD: FunctionInfo = function_info!(add);
///
/// assert_eq!(ADD.name(), "add");
/// assert!(ADD.defined_in().ends_with(".rs"));
/// ```
#[macro_export]
macro_rules! function_info {
    ($name:ident) => {
        $crate::FunctionInfo::new(stringify!($name), module_path!(), file!(), line!())
    };
    ($name:expr) => {
        $crate::FunctionInfo::new($name, module_path!(), file!(), line!())
    };
}
