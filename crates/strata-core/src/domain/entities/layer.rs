//! Layers: staged file sets applied one after another.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::DomainError;

use super::common::{is_binary, normalize_path};
use super::template::{LayerRules, Props};

/// Staging root of the main template.
pub const MAIN_ROOT: &str = "template";
/// Staging root holding one directory per extension label.
pub const EXTENDS_ROOT: &str = "extends";
/// Staging root holding one directory per component name.
pub const COMPONENTS_ROOT: &str = "components";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Files already on disk, used as the base when upgrading a project.
    Existing,
    Main,
    Extension(String),
    Component(String),
}

impl LayerKind {
    pub fn label(&self) -> String {
        match self {
            Self::Existing => "existing".to_string(),
            Self::Main => "main".to_string(),
            Self::Extension(label) => format!("extend:{label}"),
            Self::Component(name) => format!("component:{name}"),
        }
    }

    /// Directory inside the staging area this layer's files live under.
    pub fn staging_root(&self) -> Option<String> {
        match self {
            Self::Existing => None,
            Self::Main => Some(MAIN_ROOT.to_string()),
            Self::Extension(label) => Some(format!("{EXTENDS_ROOT}/{label}")),
            Self::Component(name) => Some(format!("{COMPONENTS_ROOT}/{name}")),
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A layer chosen by composition, before any file is read.
#[derive(Debug, Clone)]
pub struct LayerPlan {
    pub kind: LayerKind,
    pub rules: LayerRules,
    /// Answers given to this layer's own questions, markers stripped.
    pub answers: Props,
    pub alias: BTreeMap<String, String>,
}

impl LayerPlan {
    pub fn new(kind: LayerKind, rules: LayerRules) -> Self {
        Self {
            kind,
            rules,
            answers: Props::new(),
            alias: BTreeMap::new(),
        }
    }

    pub fn label(&self) -> String {
        self.kind.label()
    }
}

// ============================================================================
// Staging area
// ============================================================================

/// In-memory tree that layer sources write into.
///
/// Keys are normalised relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingArea {
    files: BTreeMap<String, Vec<u8>>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// [`DomainError::AbsolutePathNotAllowed`] for paths escaping the area.
    pub fn write(&mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Result<(), DomainError> {
        let path = normalize_path(path)?;
        self.files.insert(path, bytes.into());
        Ok(())
    }

    pub fn read(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files under `root`, with `root/` stripped, sorted by path.
    pub fn files_under<'s>(&'s self, root: &'s str) -> impl Iterator<Item = (&'s str, &'s [u8])> {
        let prefix = format!("{root}/");
        self.files.iter().filter_map(move |(path, bytes)| {
            path.strip_prefix(prefix.as_str())
                .map(|rest| (rest, bytes.as_slice()))
        })
    }
}

// ============================================================================
// Staged layers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerFile {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl LayerFile {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_binary(&self) -> bool {
        is_binary(&self.bytes)
    }

    pub fn text(&self) -> Option<&str> {
        if self.is_binary() {
            None
        } else {
            std::str::from_utf8(&self.bytes).ok()
        }
    }
}

/// A layer with its files read out of staging, in path order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub kind: LayerKind,
    pub files: Vec<LayerFile>,
}

impl Layer {
    pub fn new(kind: LayerKind, mut files: Vec<LayerFile>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self { kind, files }
    }

    /// Read a planned layer out of staging, applying its alias map.
    ///
    /// # Errors
    ///
    /// [`DomainError::AliasCollision`] when two staged files land on the
    /// same destination after aliasing.
    pub fn stage(plan: &LayerPlan, staging: &StagingArea) -> Result<Self, DomainError> {
        let Some(root) = plan.kind.staging_root() else {
            return Ok(Self::new(plan.kind.clone(), Vec::new()));
        };

        let mut placed: BTreeMap<String, (String, Vec<u8>)> = BTreeMap::new();
        for (source, bytes) in staging.files_under(&root) {
            let target = apply_alias(&plan.alias, source);
            if let Some((first, _)) = placed.get(&target) {
                return Err(DomainError::AliasCollision {
                    owner: plan.label(),
                    first: first.clone(),
                    second: source.to_string(),
                    target,
                });
            }
            placed.insert(target, (source.to_string(), bytes.to_vec()));
        }

        let files = placed
            .into_iter()
            .map(|(path, (_, bytes))| LayerFile::new(path, bytes))
            .collect();
        Ok(Self::new(plan.kind.clone(), files))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Exact file matches win; otherwise the longest directory prefix applies.
fn apply_alias(alias: &BTreeMap<String, String>, path: &str) -> String {
    if let Some(target) = alias.get(path) {
        return target.trim_start_matches("./").to_string();
    }

    alias
        .iter()
        .filter_map(|(from, to)| {
            let from = from.trim_start_matches("./").trim_end_matches('/');
            path.strip_prefix(from)
                .and_then(|rest| rest.strip_prefix('/'))
                .map(|rest| (from.len(), to, rest))
        })
        .max_by_key(|(len, _, _)| *len)
        .map_or_else(
            || path.to_string(),
            |(_, to, rest)| {
                let to = to.trim_start_matches("./").trim_end_matches('/');
                if to.is_empty() {
                    rest.to_string()
                } else {
                    format!("{to}/{rest}")
                }
            },
        )
}
