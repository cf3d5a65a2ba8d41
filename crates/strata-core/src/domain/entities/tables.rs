//! Working tables threaded through a generation run.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::diff::Change;

use super::merge_block::{MergeBlock, has_open_conflicts, render_text};

/// Path to merge blocks, iterated in first-insertion order.
///
/// Iteration order drives the order conflicts are presented in, so it must
/// be deterministic for a given set of layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeTable {
    order: Vec<String>,
    files: HashMap<String, Vec<MergeBlock>>,
}

impl MergeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file. A replaced file keeps its position.
    pub fn insert(&mut self, path: impl Into<String>, blocks: Vec<MergeBlock>) {
        let path = path.into();
        if !self.files.contains_key(&path) {
            self.order.push(path.clone());
        }
        self.files.insert(path, blocks);
    }

    /// Convenience for a plain, conflict-free file.
    pub fn insert_text(&mut self, path: impl Into<String>, text: &str) {
        self.insert(path, vec![MergeBlock::unchanged(text.split('\n'))]);
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<MergeBlock>> {
        let removed = self.files.remove(path)?;
        self.order.retain(|p| p != path);
        Some(removed)
    }

    pub fn get(&self, path: &str) -> Option<&[MergeBlock]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Vec<MergeBlock>> {
        self.files.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[MergeBlock])> {
        self.order
            .iter()
            .filter_map(|p| self.files.get(p).map(|b| (p.as_str(), b.as_slice())))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn render(&self, path: &str) -> Option<String> {
        self.get(path).map(render_text)
    }

    /// Paths still holding at least one open conflict, in table order.
    pub fn conflicted_paths(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, blocks)| has_open_conflicts(blocks))
            .map(|(path, _)| path.to_string())
            .collect()
    }
}

/// Path to raw bytes for files that are never merged.
pub type BinaryTable = BTreeMap<String, Vec<u8>>;

/// Final content of a generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }
}

pub type FileTable = BTreeMap<String, FileContent>;

/// Output of a generation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorResult {
    pub files: FileTable,
    /// Paths that still contain open conflicts.
    pub conflicts: Vec<String>,
}

impl GeneratorResult {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.files.get(path).and_then(FileContent::as_text)
    }
}

/// Last diff computed for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTableItem {
    pub changes: Vec<Change>,
    pub modify_length: usize,
}

pub type PatchTable = BTreeMap<String, PatchTableItem>;

/// A cached diff keyed by a digest of both inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEntry {
    pub digest: String,
    pub changes: Vec<Change>,
}

/// Label to the diffs recorded under it, oldest first.
pub type CacheTable = BTreeMap<String, Vec<PatchEntry>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_table_keeps_first_insertion_order() {
        let mut table = MergeTable::new();
        table.insert_text("b.txt", "b");
        table.insert_text("a.txt", "a");
        table.insert_text("b.txt", "b2");

        let paths: Vec<_> = table.paths().collect();
        assert_eq!(paths, vec!["b.txt", "a.txt"]);
        assert_eq!(table.render("b.txt").as_deref(), Some("b2"));
    }

    #[test]
    fn removal_drops_order_entry() {
        let mut table = MergeTable::new();
        table.insert_text("a", "1");
        table.insert_text("b", "2");

        assert!(table.remove("a").is_some());
        assert!(table.remove("a").is_none());
        assert_eq!(table.paths().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn conflicted_paths_skips_settled_files() {
        let mut table = MergeTable::new();
        table.insert_text("clean", "ok");
        table.insert(
            "dirty",
            vec![MergeBlock::conflict(vec!["a".into()], vec!["b".into()])],
        );

        assert_eq!(table.conflicted_paths(), vec!["dirty".to_string()]);
    }
}
