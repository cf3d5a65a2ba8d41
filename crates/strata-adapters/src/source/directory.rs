//! Local template directories.
//!
//! # Directory layout expected
//!
//! ```text
//! web-app/
//! ├── template.toml        ← manifest
//! ├── template/            ← main layer
//! │   └── package.json
//! ├── extends/
//! │   └── typescript/      ← extension layer "typescript"
//! │       └── package.json
//! └── components/
//!     └── docker/          ← component "docker"
//!         └── Dockerfile
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use tracing::{debug, instrument};
use walkdir::WalkDir;

use strata_core::{
    application::{FetchOptions, LayerSource, LoadError},
    domain::{
        StagingArea,
        entities::layer::{COMPONENTS_ROOT, EXTENDS_ROOT, MAIN_ROOT},
    },
};

use crate::manifest::MANIFEST_FILE;

/// Stages a template directory into a [`StagingArea`].
///
/// A locator is a path to the template directory, or a name looked up
/// in each search path in order.
#[derive(Debug, Clone, Default)]
pub struct DirectoryLayerSource {
    search_paths: Vec<PathBuf>,
}

impl DirectoryLayerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// The template directory a locator points at, if any.
    pub fn resolve(&self, locator: &str) -> Option<PathBuf> {
        let direct = PathBuf::from(locator);
        if is_template_dir(&direct) {
            return Some(direct);
        }
        self.search_paths
            .iter()
            .map(|dir| dir.join(locator))
            .find(|candidate| is_template_dir(candidate))
    }
}

fn is_template_dir(path: &Path) -> bool {
    path.join(MANIFEST_FILE).is_file() || path.join(MAIN_ROOT).is_dir()
}

impl LayerSource for DirectoryLayerSource {
    #[instrument(skip(self, staging, options))]
    fn fetch(
        &self,
        locator: &str,
        staging: &mut StagingArea,
        options: &FetchOptions,
    ) -> Result<Duration, LoadError> {
        let started = Instant::now();
        let root = self.resolve(locator).ok_or_else(|| LoadError::NotFound {
            locator: locator.to_string(),
        })?;

        let mut staged = 0usize;
        for layer_root in [MAIN_ROOT, EXTENDS_ROOT, COMPONENTS_ROOT] {
            let dir = root.join(layer_root);
            if !dir.is_dir() {
                continue;
            }

            for entry in WalkDir::new(&dir).sort_by_file_name() {
                if started.elapsed() >= options.timeout {
                    return Err(LoadError::Timeout {
                        locator: locator.to_string(),
                        attempts: 1,
                    });
                }

                let entry = entry.map_err(|e| other(locator, e))?;
                if !entry.file_type().is_file() {
                    continue;
                }

                let key = staging_key(&root, entry.path())
                    .ok_or_else(|| other(locator, format!("bad path {}", entry.path().display())))?;
                let bytes = fs::read(entry.path()).map_err(|e| other(locator, e))?;
                staging.write(&key, bytes).map_err(|e| other(locator, e))?;
                staged += 1;
            }
        }

        let elapsed = started.elapsed();
        debug!(root = %root.display(), staged, ?elapsed, "Template staged");
        Ok(elapsed)
    }
}

fn other(locator: &str, reason: impl ToString) -> LoadError {
    LoadError::Other {
        locator: locator.to_string(),
        reason: reason.to_string(),
    }
}

/// `root/extends/ts/a.json` → `extends/ts/a.json`
fn staging_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let write = |rel: &str, content: &[u8]| {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        };
        write("template.toml", b"name = \"app\"\n");
        write("template/README.md", b"# app\n");
        write("template/src/main.rs", b"fn main() {}\n");
        write("extends/ts/package.json", b"{}\n");
        write("components/docker/Dockerfile", b"FROM scratch\n");
        write("notes/ignored.txt", b"not a layer\n");
        dir
    }

    #[test]
    fn stages_every_layer_root() {
        let dir = template_dir();
        let mut staging = StagingArea::new();

        DirectoryLayerSource::new()
            .fetch(
                dir.path().to_str().unwrap(),
                &mut staging,
                &FetchOptions::default(),
            )
            .unwrap();

        let paths: Vec<&str> = staging.paths().collect();
        assert_eq!(
            paths,
            vec![
                "components/docker/Dockerfile",
                "extends/ts/package.json",
                "template/README.md",
                "template/src/main.rs",
            ]
        );
        assert_eq!(staging.read("template/README.md"), Some(&b"# app\n"[..]));
    }

    #[test]
    fn names_resolve_through_search_paths() {
        let dir = template_dir();
        let parent = dir.path().parent().unwrap();
        let name = dir.path().file_name().unwrap().to_str().unwrap();

        let source = DirectoryLayerSource::new().with_search_path(parent);

        assert_eq!(source.resolve(name), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn missing_template_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut staging = StagingArea::new();
        let locator = dir.path().join("nope");

        let err = DirectoryLayerSource::new()
            .fetch(
                locator.to_str().unwrap(),
                &mut staging,
                &FetchOptions::default(),
            )
            .unwrap_err();

        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn zero_timeout_reports_timeout() {
        let dir = template_dir();
        let mut staging = StagingArea::new();
        let options = FetchOptions {
            timeout: Duration::ZERO,
            ..FetchOptions::default()
        };

        let err = DirectoryLayerSource::new()
            .fetch(dir.path().to_str().unwrap(), &mut staging, &options)
            .unwrap_err();

        assert!(err.is_timeout());
    }
}
