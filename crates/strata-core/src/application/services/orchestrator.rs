//! Folds layers, one after another, into the merge and binary tables.
//!
//! For every file of a layer:
//!
//! 1. A path deleted by an earlier layer's delete rules is skipped
//! 2. Binary content overwrites whatever the path held
//! 3. Text at a path that matches a merge pattern and already holds text is
//!    diffed against the existing content and folded into merge blocks
//! 4. Any other text overwrites the path as a single settled block
//!
//! Paths are processed sequentially in layer order, so block order and
//! conflict order are fully deterministic.

use std::collections::BTreeSet;

use tracing::{debug, instrument, trace};

use crate::{
    application::services::patch_cache::PatchCache,
    domain::{
        BaseView, BinaryTable, DeleteContext, DeleteRule, Layer, LayerPlan, MergeBlock,
        MergeTable, PatchTable, PatchTableItem, PatternSet, Props, TemplateConfig,
        diff::{modify_length, split_lines},
        entities::merge_block::{build_blocks, carry_forward, render_text},
        normalize_path,
    },
    error::StrataResult,
};

/// What applying one layer did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerReport {
    pub label: String,
    pub written: usize,
    pub merged: usize,
    pub skipped: usize,
    pub deleted: Vec<String>,
}

pub struct MergeOrchestrator<'c> {
    merge_patterns: PatternSet,
    merge_table: MergeTable,
    binary_table: BinaryTable,
    patch_table: PatchTable,
    deleted: BTreeSet<String>,
    cache: PatchCache<'c>,
}

impl<'c> MergeOrchestrator<'c> {
    pub fn new(merge_patterns: PatternSet, cache: PatchCache<'c>) -> Self {
        Self {
            merge_patterns,
            merge_table: MergeTable::new(),
            binary_table: BinaryTable::new(),
            patch_table: PatchTable::new(),
            deleted: BTreeSet::new(),
            cache,
        }
    }

    /// Fold a staged layer, then run its delete rules.
    #[instrument(skip_all, fields(layer = %plan.label()))]
    pub fn apply_layer(
        &mut self,
        layer: &Layer,
        plan: &LayerPlan,
        config: &TemplateConfig,
        props: &Props,
    ) -> StrataResult<LayerReport> {
        let label = plan.label();
        let mut report = LayerReport {
            label: label.clone(),
            ..LayerReport::default()
        };

        for file in &layer.files {
            if self.deleted.contains(&file.path) {
                trace!(path = %file.path, "Skipping deleted path");
                report.skipped += 1;
                continue;
            }

            match file.text() {
                Some(text) => {
                    if self.fold_text(&label, &file.path, text)? {
                        report.merged += 1;
                    }
                }
                None => self.fold_binary(&file.path, file.bytes.clone()),
            }
            report.written += 1;
        }

        report.deleted = self.apply_delete_rules(&plan.rules.files.delete, config, props)?;
        debug!(
            written = report.written,
            merged = report.merged,
            deleted = report.deleted.len(),
            "Layer applied"
        );
        Ok(report)
    }

    /// Fold text into `path`. Returns `true` when it went through a merge.
    pub fn fold_text(&mut self, label: &str, path: &str, text: &str) -> StrataResult<bool> {
        let incoming = split_lines(text);

        let existing = match self.merge_table.get(path) {
            Some(blocks) if self.merge_patterns.matches(path) => blocks,
            _ => {
                self.binary_table.remove(path);
                self.merge_table
                    .insert(path, vec![MergeBlock::unchanged(incoming.iter().copied())]);
                return Ok(false);
            }
        };

        let view = BaseView::of(existing);
        let former = view.as_strs();
        let mut changes = self.cache.diff(&format!("{label}:{path}"), &former, &incoming);
        let modified = modify_length(&changes);

        if modified == 0 {
            self.patch_table.insert(
                path.to_string(),
                PatchTableItem {
                    changes,
                    modify_length: 0,
                },
            );
            return Ok(true);
        }

        let rebuilt = build_blocks(path, &former, &incoming, &mut changes)?;
        let blocks = carry_forward(existing, &view, rebuilt);
        self.patch_table.insert(
            path.to_string(),
            PatchTableItem {
                changes,
                modify_length: modified,
            },
        );
        self.merge_table.insert(path, blocks);
        Ok(true)
    }

    /// Fold a block list into `path`.
    ///
    /// Blocks without unsettled conflicts are folded as their rendered text.
    /// Blocks carrying conflicts replace the path as given, so the conflicts
    /// stay structured and reach the resolver.
    pub fn fold_blocks(
        &mut self,
        label: &str,
        path: &str,
        blocks: &[MergeBlock],
    ) -> StrataResult<bool> {
        if !blocks.iter().any(MergeBlock::is_unsettled) {
            return self.fold_text(label, path, &render_text(blocks));
        }

        debug!(path, "Taking conflicted blocks as given");
        self.binary_table.remove(path);
        self.merge_table.insert(path, blocks.to_vec());
        Ok(false)
    }

    pub fn fold_binary(&mut self, path: &str, bytes: Vec<u8>) {
        self.merge_table.remove(path);
        self.binary_table.insert(path.to_string(), bytes);
    }

    /// Drop a path from both tables.
    pub fn remove(&mut self, path: &str) -> bool {
        let text = self.merge_table.remove(path).is_some();
        let binary = self.binary_table.remove(path).is_some();
        text || binary
    }

    fn apply_delete_rules(
        &mut self,
        rules: &[DeleteRule],
        config: &TemplateConfig,
        props: &Props,
    ) -> StrataResult<Vec<String>> {
        let mut removed = Vec::new();
        for rule in rules {
            let targets = self.targets();
            let paths = match rule {
                DeleteRule::Pattern(pattern) => {
                    let set = PatternSet::compile([pattern])?;
                    targets.iter().filter(|p| set.matches(p)).cloned().collect()
                }
                DeleteRule::Handler(handler) => handler(&DeleteContext {
                    config,
                    props,
                    targets: &targets,
                }),
            };

            for path in paths {
                let path = normalize_path(&path)?;
                if self.remove(&path) {
                    removed.push(path.clone());
                }
                self.deleted.insert(path);
            }
        }
        Ok(removed)
    }

    /// Every path in either table, sorted.
    pub fn targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self
            .merge_table
            .paths()
            .map(str::to_string)
            .chain(self.binary_table.keys().cloned())
            .collect();
        targets.sort();
        targets
    }

    pub fn merge_table(&self) -> &MergeTable {
        &self.merge_table
    }

    pub fn merge_table_mut(&mut self) -> &mut MergeTable {
        &mut self.merge_table
    }

    pub fn binary_table(&self) -> &BinaryTable {
        &self.binary_table
    }

    pub fn patch_table(&self) -> &PatchTable {
        &self.patch_table
    }

    pub fn is_deleted(&self, path: &str) -> bool {
        self.deleted.contains(path)
    }

    pub fn cache(&self) -> &PatchCache<'c> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut PatchCache<'c> {
        &mut self.cache
    }
}
