use std::{
    fs,
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use strata_core::{application::CacheStore, error::StrataResult};

use crate::filesystem::map_io_error;

/// Cache store backed by one file per label.
///
/// Labels contain `/` and `:`, so each file is named by the SHA-256 of its
/// label instead.
#[derive(Debug, Clone)]
pub struct DirectoryCacheStore {
    root: PathBuf,
}

impl DirectoryCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, label: &str) -> PathBuf {
        let digest = Sha256::digest(label.as_bytes());
        let name: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.root.join(name)
    }
}

impl CacheStore for DirectoryCacheStore {
    fn get(&self, label: &str) -> Option<Vec<u8>> {
        let path = self.entry_path(label);
        match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(label, path = %path.display(), error = %e, "Unreadable cache entry");
                None
            }
        }
    }

    fn set(&self, label: &str, data: &[u8]) -> StrataResult<()> {
        fs::create_dir_all(&self.root).map_err(|e| map_io_error(&self.root, e, "create cache directory"))?;
        let path = self.entry_path(label);
        fs::write(&path, data).map_err(|e| map_io_error(&path, e, "write cache entry"))?;
        debug!(label, bytes = data.len(), "Cache entry written");
        Ok(())
    }
}
