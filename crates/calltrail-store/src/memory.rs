//! In-process audit store.

use crate::{AuditStore, StoreError};
use async_trait::async_trait;
use calltrail_types::AuditRecord;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Audit store that keeps records in memory.
///
/// Useful for tests and for processes that inspect their own audit trail.
/// It can be switched offline to simulate an unreachable store.
pub struct MemoryAuditStore {
    name: String,
    records: Mutex<Vec<AuditRecord>>,
    available: AtomicBool,
}

impl MemoryAuditStore {
    /// Create an empty, available store.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Make subsequent inserts succeed or fail with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Snapshot of all stored records, in insertion order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drop all stored records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for MemoryAuditStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn insert(&self, record: &AuditRecord) -> Result<(), StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(self.name.clone()));
        }

        self.records.lock().push(record.clone());
        Ok(())
    }
}
