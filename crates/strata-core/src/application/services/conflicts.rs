//! Conflict protocol: present each open conflict to a resolver, in order.
//!
//! Files are visited in merge-table order and blocks in file order. The
//! resolver sees the file as rendered at that moment, so earlier answers in
//! the same file are already applied. Each conflict is asked about once; a
//! block left open stays open on later passes without another question.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, info, warn};

use crate::{
    application::ports::ConflictResolver,
    domain::{
        ConflictSolveResult, ConflictSolverData, MergeBlock, MergeTable,
        entities::merge_block::render_text,
    },
};

/// A resolver failure, reported instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverWarning {
    pub path: String,
    pub block_index: usize,
    pub message: String,
}

impl fmt::Display for ResolverWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resolver failed on {} (block {}): {}",
            self.path, self.block_index, self.message
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub presented: usize,
    pub resolved: usize,
    pub ignored: usize,
    pub left_open: usize,
    pub warnings: Vec<ResolverWarning>,
}

impl ResolutionReport {
    pub fn absorb(&mut self, other: Self) {
        self.presented += other.presented;
        self.resolved += other.resolved;
        self.ignored += other.ignored;
        self.left_open += other.left_open;
        self.warnings.extend(other.warnings);
    }
}

pub struct ConflictProtocol<'r> {
    resolver: &'r dyn ConflictResolver,
}

impl<'r> ConflictProtocol<'r> {
    pub fn new(resolver: &'r dyn ConflictResolver) -> Self {
        Self { resolver }
    }

    /// Resolve open conflicts, optionally only in `scope`.
    pub fn resolve(&self, table: &mut MergeTable, scope: Option<&BTreeSet<String>>) -> ResolutionReport {
        let paths: Vec<String> = table
            .paths()
            .filter(|p| scope.is_none_or(|s| s.contains(*p)))
            .map(str::to_string)
            .collect();

        let mut report = ResolutionReport::default();
        for path in paths {
            if let Some(blocks) = table.get_mut(&path) {
                report.absorb(self.resolve_file(&path, blocks));
            }
        }

        if report.presented > 0 {
            info!(
                presented = report.presented,
                resolved = report.resolved,
                ignored = report.ignored,
                open = report.left_open,
                "Conflicts processed"
            );
        }
        report
    }

    fn resolve_file(&self, path: &str, blocks: &mut [MergeBlock]) -> ResolutionReport {
        let open: Vec<usize> = blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.awaits_resolver())
            .map(|(i, _)| i)
            .collect();
        let total = open.len();
        let mut report = ResolutionReport::default();

        for (index, block_index) in open.into_iter().enumerate() {
            let data = ConflictSolverData {
                path: path.to_string(),
                index,
                total,
                block_index,
                block: blocks[block_index].clone(),
                content: render_text(blocks),
            };
            report.presented += 1;

            let outcome = self.resolver.resolve(&data);
            blocks[block_index].answered = true;

            match outcome {
                Ok(ConflictSolveResult::Resolved(block)) => match settle(block) {
                    Some(block) => {
                        blocks[block_index] = block;
                        report.resolved += 1;
                    }
                    None => {
                        warn!(path, block_index, "Resolver answer still conflicts");
                        report.left_open += 1;
                        report.warnings.push(ResolverWarning {
                            path: path.to_string(),
                            block_index,
                            message: "resolver returned a block that still conflicts".into(),
                        });
                    }
                },
                Ok(ConflictSolveResult::Ignored) => {
                    blocks[block_index].ignored = true;
                    report.ignored += 1;
                }
                Ok(ConflictSolveResult::Unresolved) => {
                    debug!(path, block_index, "Conflict left open");
                    report.left_open += 1;
                }
                Err(e) => {
                    warn!(path, block_index, error = %e, "Resolver failed");
                    report.left_open += 1;
                    report.warnings.push(ResolverWarning {
                        path: path.to_string(),
                        block_index,
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

/// Mark a resolver's replacement block as settled.
///
/// `None` when the block is still a conflict with two different sides.
fn settle(mut block: MergeBlock) -> Option<MergeBlock> {
    if block.is_conflict() {
        if block.values.former != block.values.current {
            return None;
        }
        block = MergeBlock::unchanged(block.values.current);
    }
    block.resolved = true;
    block.ignored = false;
    block.answered = true;
    Some(block)
}
