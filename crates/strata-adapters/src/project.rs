//! Reading an existing project as the base layer for upgrades.

use std::{fs, path::Path};

use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

use strata_core::{
    application::ApplicationError,
    domain::{Layer, LayerFile, LayerKind},
    error::StrataResult,
};

use crate::filesystem::map_io_error;

/// Directories never read into the base layer.
const SKIPPED_DIRS: &[&str] = &[".git"];

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// Read every file under `root` into an [`LayerKind::Existing`] layer.
///
/// # Errors
///
/// `FilesystemError` when `root` is not a directory or a file cannot be
/// read.
#[instrument(fields(root = %root.display()))]
pub fn read_existing_project(root: &Path) -> StrataResult<Layer> {
    if !root.is_dir() {
        return Err(ApplicationError::FilesystemError {
            path: root.to_path_buf(),
            reason: "Not a directory".into(),
        }
        .into());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_skipped(e)) {
        let entry = entry.map_err(|e| ApplicationError::FilesystemError {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(relative) = relative_key(root, entry.path()) else {
            continue;
        };
        let bytes = fs::read(entry.path()).map_err(|e| map_io_error(entry.path(), e, "read file"))?;
        files.push(LayerFile::new(relative, bytes));
    }

    debug!(files = files.len(), "Existing project read");
    Ok(Layer::new(LayerKind::Existing, files))
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}
