//! Local filesystem adapter using std::fs.

use std::io;
use std::path::Path;

use strata_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{StrataError, StrataResult},
};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> StrataResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> StrataResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_dir_all(&self, path: &Path) -> StrataResult<()> {
        std::fs::remove_dir_all(path).map_err(|e| map_io_error(path, e, "remove directory"))
    }
}

pub(crate) fn map_io_error(path: &Path, e: io::Error, operation: &str) -> StrataError {
    ApplicationError::FilesystemError {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFilesystem::new();
        let nested = dir.path().join("a/b");

        fs.create_dir_all(&nested).unwrap();
        fs.write_file(&nested.join("logo.png"), &[0x89, 0, 1]).unwrap();

        assert_eq!(std::fs::read(nested.join("logo.png")).unwrap(), vec![0x89, 0, 1]);
        assert!(fs.exists(&nested));
    }

    #[test]
    fn write_into_missing_directory_is_a_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFilesystem::new();

        let err = fs
            .write_file(&dir.path().join("missing/file.txt"), b"x")
            .unwrap_err();

        assert!(matches!(
            err,
            StrataError::Application(ApplicationError::FilesystemError { .. })
        ));
    }

    #[test]
    fn remove_dir_all_deletes_tree() {
        let dir = tempfile::tempdir().unwrap();
        let fs = LocalFilesystem::new();
        let out = dir.path().join("out");
        fs.create_dir_all(&out.join("src")).unwrap();
        fs.write_file(&out.join("src/main.rs"), b"fn main() {}").unwrap();

        fs.remove_dir_all(&out).unwrap();

        assert!(!fs.exists(&out));
    }
}
