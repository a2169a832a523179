//! Call tracing and auditing for calltrail.
//!
//! [`ExecutionTracer`] logs entry, result, error and duration of a call.
//! [`AuditedExecutionTracer`] does the same inside an `audited_call` span,
//! collects every line logged during the call and writes one
//! [`AuditRecord`](calltrail_types::AuditRecord) per call to an
//! [`AuditStore`](calltrail_store::AuditStore).
//!
//! ```no_run
//! use calltrail_log::LogConfig;
//! use calltrail_store::MemoryAuditStore;
//! use calltrail_tracer::{AuditConfig, AuditedExecutionTracer};
//! use calltrail_types::function_info;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let capture = calltrail_log::init(LogConfig::default())?;
//! let tracer = AuditedExecutionTracer::builder()
//!     .store(Arc::new(MemoryAuditStore::new("BI")))
//!     .capture(capture)
//!     .config(AuditConfig::new().custom_message("billing run"))
//!     .build()?;
//!
//! fn add((a, b): (i64, i64)) -> Result<i64, String> {
//!     Ok(a + b)
//! }
//! let add = tracer.wrap(function_info!(add), add);
//! assert_eq!(add.call((2, 3)).await, Ok(5));
//! # Ok(())
//! # }
//! ```

mod audited;
mod error;
mod identity;
mod tracer;

pub use audited::{open_store, AuditConfig, Audited, AuditedExecutionTracer, AuditedExecutionTracerBuilder};
pub use error::{PersistFailure, TracerError};
pub use identity::{IdentityResolver, StaticIdentity, SystemIdentity};
pub use tracer::{ExecutionTracer, Traced};
