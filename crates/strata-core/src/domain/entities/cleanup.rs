//! Capability object handed to cleanup hooks.

use super::merge_block::render_text;
use super::tables::{BinaryTable, MergeTable};

/// A file operation staged by a cleanup hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOp {
    WriteText { path: String, content: String },
    WriteBinary { path: String, bytes: Vec<u8> },
    Delete { path: String },
}

impl CleanupOp {
    pub fn path(&self) -> &str {
        match self {
            Self::WriteText { path, .. } | Self::WriteBinary { path, .. } | Self::Delete { path } => {
                path
            }
        }
    }
}

/// Read access to the merged tables plus a queue of staged writes.
///
/// Reads see the hook's own staged operations first, so a hook can write a
/// file and read it back.
pub struct CleanupContext<'a> {
    merge_table: &'a MergeTable,
    binary_table: &'a BinaryTable,
    ops: Vec<CleanupOp>,
}

impl<'a> CleanupContext<'a> {
    pub fn new(merge_table: &'a MergeTable, binary_table: &'a BinaryTable) -> Self {
        Self {
            merge_table,
            binary_table,
            ops: Vec::new(),
        }
    }

    pub fn add_text_file(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.ops.push(CleanupOp::WriteText {
            path: path.into(),
            content: content.into(),
        });
    }

    /// Alias for [`Self::add_text_file`].
    pub fn add_file(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.add_text_file(path, content);
    }

    pub fn add_binary_file(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.ops.push(CleanupOp::WriteBinary {
            path: path.into(),
            bytes,
        });
    }

    pub fn delete_files<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ops
            .extend(paths.into_iter().map(|p| CleanupOp::Delete { path: p.into() }));
    }

    fn latest_op(&self, path: &str) -> Option<&CleanupOp> {
        self.ops.iter().rev().find(|op| op.path() == path)
    }

    pub fn exists(&self, path: &str) -> bool {
        match self.latest_op(path) {
            Some(CleanupOp::Delete { .. }) => false,
            Some(_) => true,
            None => self.merge_table.contains(path) || self.binary_table.contains_key(path),
        }
    }

    /// Rendered text of a file, conflict markers included.
    pub fn text_content(&self, path: &str) -> Option<String> {
        match self.latest_op(path) {
            Some(CleanupOp::WriteText { content, .. }) => Some(content.clone()),
            Some(_) => None,
            None => self.merge_table.get(path).map(render_text),
        }
    }

    pub fn binary_content(&self, path: &str) -> Option<Vec<u8>> {
        match self.latest_op(path) {
            Some(CleanupOp::WriteBinary { bytes, .. }) => Some(bytes.clone()),
            Some(_) => None,
            None => self.binary_table.get(path).cloned(),
        }
    }

    /// Every path visible to the hook, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .merge_table
            .paths()
            .map(str::to_string)
            .chain(self.binary_table.keys().cloned())
            .chain(self.ops.iter().map(|op| op.path().to_string()))
            .collect();
        paths.sort();
        paths.dedup();
        paths.retain(|p| self.exists(p));
        paths
    }

    pub fn into_ops(self) -> Vec<CleanupOp> {
        self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_operations_shadow_tables() {
        let mut merge = MergeTable::new();
        merge.insert_text("README.md", "# demo\n");
        let binary = BinaryTable::from([("logo.png".to_string(), vec![0, 1, 2])]);

        let mut ctx = CleanupContext::new(&merge, &binary);
        assert_eq!(ctx.text_content("README.md").as_deref(), Some("# demo\n"));
        assert_eq!(ctx.binary_content("logo.png"), Some(vec![0, 1, 2]));

        ctx.add_file("NOTES.md", "notes");
        ctx.delete_files(["README.md"]);

        assert!(ctx.exists("NOTES.md"));
        assert!(!ctx.exists("README.md"));
        assert_eq!(ctx.text_content("README.md"), None);
        assert_eq!(ctx.paths(), vec!["NOTES.md", "logo.png"]);

        let ops = ctx.into_ops();
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn later_write_revives_deleted_path() {
        let merge = MergeTable::new();
        let binary = BinaryTable::new();
        let mut ctx = CleanupContext::new(&merge, &binary);

        ctx.delete_files(["a"]);
        ctx.add_text_file("a", "back");

        assert!(ctx.exists("a"));
        assert_eq!(ctx.text_content("a").as_deref(), Some("back"));
    }
}
