use serde::{Deserialize, Serialize};

use super::merge_block::MergeBlock;

/// What a resolver sees for one open conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSolverData {
    pub path: String,
    /// Zero-based position among this file's open conflicts.
    pub index: usize,
    /// Number of open conflicts in the file when resolution started.
    pub total: usize,
    /// Position of the block inside the file's block list.
    pub block_index: usize,
    pub block: MergeBlock,
    /// Whole file as currently rendered, earlier answers applied.
    pub content: String,
}

/// A resolver's answer for one conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictSolveResult {
    /// Replace the conflict with this block.
    Resolved(MergeBlock),
    /// Leave the conflict with its markers and stop asking about it.
    Ignored,
    /// No decision; the conflict stays open.
    Unresolved,
}

impl ConflictSolveResult {
    pub fn keep_current(block: &MergeBlock) -> Self {
        Self::Resolved(MergeBlock::resolved_with(block.values.current.iter().cloned()))
    }

    pub fn keep_former(block: &MergeBlock) -> Self {
        Self::Resolved(MergeBlock::resolved_with(block.values.former.iter().cloned()))
    }

    /// Resolve to literal text, split on `\n`.
    pub fn with_text(text: &str) -> Self {
        Self::Resolved(MergeBlock::resolved_with(text.split('\n')))
    }
}
