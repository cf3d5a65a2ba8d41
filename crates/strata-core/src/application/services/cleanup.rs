//! Post-merge cleanup hooks.
//!
//! Hooks run in layer order, each against the tables as left by the hooks
//! before it. Staged operations are applied first, then the returned
//! fragment is folded in like any other layer. Conflicts in the fragment are
//! kept as conflicts.

use std::collections::BTreeSet;

use tracing::{debug, instrument};

use crate::{
    application::services::orchestrator::MergeOrchestrator,
    domain::{CleanupContext, CleanupOp, LayerPlan, normalize_path},
    error::StrataResult,
};

/// Run every cleanup declared by `layers` and return the touched paths.
#[instrument(skip_all)]
pub fn run_cleanups(
    orchestrator: &mut MergeOrchestrator<'_>,
    layers: &[LayerPlan],
) -> StrataResult<BTreeSet<String>> {
    let mut touched = BTreeSet::new();

    for plan in layers {
        for cleanup in &plan.rules.cleanups {
            let label = format!("cleanup:{}", cleanup.name);
            let (ops, fragment) = {
                let mut ctx =
                    CleanupContext::new(orchestrator.merge_table(), orchestrator.binary_table());
                let fragment = (cleanup.run)(&mut ctx);
                (ctx.into_ops(), fragment)
            };
            debug!(
                cleanup = %cleanup.name,
                ops = ops.len(),
                fragment = fragment.len(),
                "Cleanup ran"
            );

            for op in ops {
                let path = normalize_path(op.path())?;
                match op {
                    CleanupOp::WriteText { content, .. } => {
                        orchestrator.fold_text(&label, &path, &content)?;
                    }
                    CleanupOp::WriteBinary { bytes, .. } => orchestrator.fold_binary(&path, bytes),
                    CleanupOp::Delete { .. } => {
                        orchestrator.remove(&path);
                    }
                }
                touched.insert(path);
            }

            for (path, blocks) in fragment.iter() {
                let path = normalize_path(path)?;
                orchestrator.fold_blocks(&label, &path, blocks)?;
                touched.insert(path);
            }
        }
    }

    Ok(touched)
}
