//! Memoised diffs, optionally persisted through a [`CacheStore`].
//!
//! Each diff is recorded under a label (`<layer>:<path>`) with a sha256
//! digest of both inputs. A later request with the same label and digest
//! reuses the recorded changes instead of diffing again.

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{
    application::{ApplicationError, ports::CacheStore},
    domain::{
        CacheTable, Change, PatchEntry,
        diff::{diff_lines, join_lines},
    },
    error::StrataResult,
};

const STORE_PREFIX: &str = "patches/";

pub struct PatchCache<'s> {
    store: Option<&'s dyn CacheStore>,
    table: CacheTable,
    loaded: BTreeSet<String>,
    dirty: BTreeSet<String>,
    hits: usize,
    misses: usize,
}

impl<'s> PatchCache<'s> {
    pub fn new(store: Option<&'s dyn CacheStore>) -> Self {
        Self {
            store,
            table: CacheTable::new(),
            loaded: BTreeSet::new(),
            dirty: BTreeSet::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// A cache that only memoises within this run.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub fn digest(former: &[&str], current: &[&str]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(join_lines(former).as_bytes());
        hasher.update([0u8]);
        hasher.update(join_lines(current).as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Diff `former` against `current`, reusing a recorded result when the
    /// digest matches.
    pub fn diff(&mut self, label: &str, former: &[&str], current: &[&str]) -> Vec<Change> {
        self.load(label);
        let digest = Self::digest(former, current);

        if let Some(entry) = self
            .table
            .get(label)
            .and_then(|entries| entries.iter().find(|e| e.digest == digest))
        {
            self.hits += 1;
            debug!(label, "Patch cache hit");
            return entry.changes.clone();
        }

        self.misses += 1;
        let changes = diff_lines(former, current);
        self.table
            .entry(label.to_string())
            .or_default()
            .push(PatchEntry {
                digest,
                changes: changes.clone(),
            });
        self.dirty.insert(label.to_string());
        changes
    }

    fn load(&mut self, label: &str) {
        if !self.loaded.insert(label.to_string()) {
            return;
        }
        let Some(store) = self.store else {
            return;
        };
        let Some(bytes) = store.get(&format!("{STORE_PREFIX}{label}")) else {
            return;
        };

        match serde_json::from_slice::<Vec<PatchEntry>>(&bytes) {
            Ok(entries) => {
                self.table.insert(label.to_string(), entries);
            }
            Err(e) => warn!(label, error = %e, "Ignoring unreadable patch cache entry"),
        }
    }

    /// Write every label that gained entries back to the store.
    ///
    /// # Errors
    ///
    /// [`ApplicationError::CacheFailed`] for the first label that fails.
    pub fn flush(&mut self) -> StrataResult<()> {
        let Some(store) = self.store else {
            self.dirty.clear();
            return Ok(());
        };

        for label in std::mem::take(&mut self.dirty) {
            let Some(entries) = self.table.get(&label) else {
                continue;
            };
            let bytes = serde_json::to_vec(entries).map_err(|e| ApplicationError::CacheFailed {
                label: label.clone(),
                reason: e.to_string(),
            })?;
            store.set(&format!("{STORE_PREFIX}{label}"), &bytes)?;
        }
        Ok(())
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn entries(&self, label: &str) -> &[PatchEntry] {
        self.table.get(label).map_or(&[], Vec::as_slice)
    }
}
