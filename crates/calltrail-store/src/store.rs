//! The audit store capability.

use crate::StoreError;
use async_trait::async_trait;
use calltrail_types::AuditRecord;

/// A durable destination for audit records.
///
/// Each `insert` is self-contained: one record, one transaction. It either
/// commits the whole row or leaves the store unchanged. Implementations must
/// accept concurrent inserts.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Logical name of the store.
    fn name(&self) -> &str;

    /// Persist one record atomically.
    async fn insert(&self, record: &AuditRecord) -> Result<(), StoreError>;
}
