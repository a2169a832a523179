//! Durable audit store for calltrail.
//!
//! An [`AuditStore`] persists one [`AuditRecord`](calltrail_types::AuditRecord)
//! per audited call inside its own transaction. [`SqliteAuditStore`] is the
//! durable implementation; [`MemoryAuditStore`] keeps records in process.
//! [`StoreRegistry`] maps logical store names to instances.

mod error;
mod memory;
mod pool;
mod registry;
mod schema;
mod sqlite;
mod store;

pub use error::StoreError;
pub use memory::MemoryAuditStore;
pub use pool::{DatabasePool, PoolConfig, PoolConfigBuilder, SynchronousMode};
pub use registry::StoreRegistry;
pub use schema::{AuditTable, COLUMNS, DEFAULT_TABLE};
pub use sqlite::SqliteAuditStore;
pub use store::AuditStore;
