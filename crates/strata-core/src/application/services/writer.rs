//! Write a [`GeneratorResult`] to disk through the [`Filesystem`] port.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::{
    application::{ApplicationError, ports::Filesystem},
    domain::{GeneratorResult, normalize_path},
    error::StrataResult,
};

/// How to treat an existing output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Refuse if the directory exists.
    #[default]
    Create,
    /// Write into an existing directory, replacing generated paths.
    Update,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub root: PathBuf,
    pub files: usize,
    pub conflicted: usize,
}

pub struct ResultWriter {
    filesystem: Box<dyn Filesystem>,
}

impl ResultWriter {
    pub fn new(filesystem: Box<dyn Filesystem>) -> Self {
        Self { filesystem }
    }

    /// Write every file under `root`.
    ///
    /// In [`WriteMode::Create`] a failed write rolls the directory back.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn write(
        &self,
        result: &GeneratorResult,
        root: &Path,
        mode: WriteMode,
    ) -> StrataResult<WriteSummary> {
        let existed = self.filesystem.exists(root);
        if existed && mode == WriteMode::Create {
            return Err(ApplicationError::ProjectExists {
                path: root.to_path_buf(),
            }
            .into());
        }

        match self.write_all(result, root) {
            Ok(files) => {
                info!(files, "Successfully wrote all files");
                Ok(WriteSummary {
                    root: root.to_path_buf(),
                    files,
                    conflicted: result.conflicts.len(),
                })
            }
            Err(e) => {
                if !existed {
                    warn!("Write failed, attempting rollback");
                    self.rollback(root);
                }
                Err(e)
            }
        }
    }

    fn write_all(&self, result: &GeneratorResult, root: &Path) -> StrataResult<usize> {
        self.filesystem.create_dir_all(root)?;

        for (path, content) in &result.files {
            let path = root.join(normalize_path(path)?);
            if let Some(parent) = path.parent() {
                self.filesystem.create_dir_all(parent)?;
            }
            self.filesystem.write_file(&path, content.as_bytes())?;
        }

        Ok(result.files.len())
    }

    /// Best-effort rollback on failure.
    fn rollback(&self, root: &Path) {
        if let Err(e) = self.filesystem.remove_dir_all(root) {
            warn!(
                error = %e,
                path = %root.display(),
                "Rollback failed"
            );
        } else {
            info!("Rollback successful");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockFilesystem;
    use crate::domain::FileContent;
    use crate::error::StrataError;

    fn result() -> GeneratorResult {
        let mut result = GeneratorResult::default();
        result
            .files
            .insert("src/main.rs".into(), FileContent::Text("fn main() {}\n".into()));
        result
            .files
            .insert("logo.png".into(), FileContent::Binary(vec![0, 1]));
        result
    }

    #[test]
    fn refuses_existing_directory_in_create_mode() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(true);
        fs.expect_write_file().never();

        let err = ResultWriter::new(Box::new(fs))
            .write(&result(), Path::new("/out"), WriteMode::Create)
            .unwrap_err();
        assert!(matches!(
            err,
            StrataError::Application(ApplicationError::ProjectExists { .. })
        ));
    }

    #[test]
    fn writes_files_with_parents() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file().times(2).returning(|_, _| Ok(()));

        let summary = ResultWriter::new(Box::new(fs))
            .write(&result(), Path::new("/out"), WriteMode::Create)
            .unwrap();
        assert_eq!(summary.files, 2);
    }

    #[test]
    fn failed_write_rolls_back_new_directory() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file().returning(|p, _| {
            Err(ApplicationError::FilesystemError {
                path: p.to_path_buf(),
                reason: "disk full".into(),
            }
            .into())
        });
        fs.expect_remove_dir_all().times(1).returning(|_| Ok(()));

        assert!(
            ResultWriter::new(Box::new(fs))
                .write(&result(), Path::new("/out"), WriteMode::Create)
                .is_err()
        );
    }

    #[test]
    fn update_mode_never_removes_existing_directory() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(true);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file().returning(|p, _| {
            Err(ApplicationError::FilesystemError {
                path: p.to_path_buf(),
                reason: "denied".into(),
            }
            .into())
        });
        fs.expect_remove_dir_all().never();

        assert!(
            ResultWriter::new(Box::new(fs))
                .write(&result(), Path::new("/out"), WriteMode::Update)
                .is_err()
        );
    }
}
