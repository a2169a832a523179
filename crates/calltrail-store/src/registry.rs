//! Named audit stores.

use crate::{AuditStore, StoreError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Resolves logical store names to audit stores.
///
/// Held explicitly by whoever builds tracers; there is no process-global
/// registry.
#[derive(Default)]
pub struct StoreRegistry {
    stores: RwLock<HashMap<String, Arc<dyn AuditStore>>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store under its own name, replacing any previous one.
    pub fn register(&self, store: Arc<dyn AuditStore>) -> Option<Arc<dyn AuditStore>> {
        let name = store.name().to_string();
        info!(store = %name, "Audit store registered");
        self.stores.write().insert(name, store)
    }

    /// Look up a store by logical name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn AuditStore>, StoreError> {
        self.stores
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownStore(name.to_string()))
    }

    /// Registered store names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.read().keys().cloned().collect();
        names.sort();
        names
    }
}
