use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use strata_core::{
    application::{ApplicationError, CacheStore},
    error::StrataResult,
};

/// Cache store that lives as long as the process.
///
/// Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, label: &str) -> Option<Vec<u8>> {
        self.entries.read().ok()?.get(label).cloned()
    }

    fn set(&self, label: &str, data: &[u8]) -> StrataResult<()> {
        self.entries
            .write()
            .map_err(|_| ApplicationError::StoreLockError)?
            .insert(label.to_string(), data.to_vec());
        Ok(())
    }
}
