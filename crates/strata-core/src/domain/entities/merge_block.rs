//! Merge blocks: the per-file unit the conflict protocol works on.
//!
//! A file under merge is an ordered list of [`MergeBlock`]s. Rendering the
//! list front to back reproduces the file, with unsettled conflicts spelled
//! out between git-style markers.

use serde::{Deserialize, Serialize};

use crate::domain::{
    DomainError,
    diff::{Change, ChangeKind, ConflictGroup, join_lines, verify_reconstruction},
};

pub const FORMER_MARKER: &str = "<<<<<<< former";
pub const SEPARATOR_MARKER: &str = "=======";
pub const CURRENT_MARKER: &str = ">>>>>>> current";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockStatus {
    Ok,
    Conflict,
}

/// Lines on each side of a block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockValues {
    pub former: Vec<String>,
    pub current: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeBlock {
    pub status: BlockStatus,
    pub values: BlockValues,
    /// The resolver chose to leave this conflict in place.
    #[serde(default)]
    pub ignored: bool,
    /// The resolver supplied replacement content.
    #[serde(default)]
    pub resolved: bool,
    /// The resolver has already been asked about this conflict.
    #[serde(default)]
    pub answered: bool,
}

impl MergeBlock {
    /// Lines both sides agree on.
    pub fn unchanged<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        Self::ok(lines.clone(), lines)
    }

    /// Lines only the incoming side has.
    pub fn insertion(lines: Vec<String>) -> Self {
        Self::ok(Vec::new(), lines)
    }

    /// Lines only the existing side has. They are kept on render.
    pub fn deletion(lines: Vec<String>) -> Self {
        Self::ok(lines, Vec::new())
    }

    pub fn conflict(former: Vec<String>, current: Vec<String>) -> Self {
        Self {
            status: BlockStatus::Conflict,
            values: BlockValues { former, current },
            ignored: false,
            resolved: false,
            answered: false,
        }
    }

    /// A settled block holding exactly `lines`.
    pub fn resolved_with<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        let mut block = Self::unchanged(lines);
        block.resolved = true;
        block
    }

    fn ok(former: Vec<String>, current: Vec<String>) -> Self {
        Self {
            status: BlockStatus::Ok,
            values: BlockValues { former, current },
            ignored: false,
            resolved: false,
            answered: false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.status == BlockStatus::Conflict
    }

    /// A conflict nobody has answered yet.
    pub fn is_open_conflict(&self) -> bool {
        self.is_conflict() && !self.ignored && !self.resolved
    }

    /// An open conflict the resolver has not seen yet.
    pub fn awaits_resolver(&self) -> bool {
        self.is_open_conflict() && !self.answered
    }

    /// A conflict still carrying both sides, open or ignored.
    pub fn is_unsettled(&self) -> bool {
        self.is_conflict() && !self.resolved
    }

    /// Lines a settled block contributes: the current side, falling back to
    /// the former side when the current side is empty.
    pub fn settled_lines(&self) -> &[String] {
        if self.values.current.is_empty() {
            &self.values.former
        } else {
            &self.values.current
        }
    }

    pub fn render_into(&self, out: &mut Vec<String>) {
        if self.is_unsettled() {
            out.push(FORMER_MARKER.to_string());
            out.extend(self.values.former.iter().cloned());
            out.push(SEPARATOR_MARKER.to_string());
            out.extend(self.values.current.iter().cloned());
            out.push(CURRENT_MARKER.to_string());
        } else {
            out.extend(self.settled_lines().iter().cloned());
        }
    }
}

pub fn render_lines(blocks: &[MergeBlock]) -> Vec<String> {
    let mut out = Vec::new();
    for block in blocks {
        block.render_into(&mut out);
    }
    out
}

/// Final text of a file.
pub fn render_text(blocks: &[MergeBlock]) -> String {
    join_lines(&render_lines(blocks))
}

pub fn has_open_conflicts(blocks: &[MergeBlock]) -> bool {
    blocks.iter().any(MergeBlock::is_open_conflict)
}

/// Turn a verified change sequence into merge blocks.
///
/// Every maximal stretch of `added`/`removed` runs between two non-empty
/// `unchanged` runs becomes one block: a `CONFLICT` when it carries both
/// removals and additions, otherwise an `OK` insertion or deletion. Runs that
/// end up in a conflict are tagged with their side.
///
/// # Errors
///
/// [`DomainError::DiffInvariant`] when `changes` does not replay to `former`
/// and `current`.
pub fn build_blocks(
    path: &str,
    former: &[&str],
    current: &[&str],
    changes: &mut [Change],
) -> Result<Vec<MergeBlock>, DomainError> {
    verify_reconstruction(path, changes, former, current)?;

    let mut blocks = Vec::new();
    let mut pending: Vec<usize> = Vec::new();

    for i in 0..changes.len() {
        if changes[i].kind != ChangeKind::Unchanged {
            pending.push(i);
            continue;
        }
        if changes[i].is_empty() {
            continue;
        }
        flush_stretch(changes, &mut pending, &mut blocks);
        blocks.push(MergeBlock::unchanged(changes[i].values.clone()));
    }
    flush_stretch(changes, &mut pending, &mut blocks);

    Ok(blocks)
}

fn flush_stretch(changes: &mut [Change], pending: &mut Vec<usize>, blocks: &mut Vec<MergeBlock>) {
    if pending.is_empty() {
        return;
    }

    let mut removed = Vec::new();
    let mut added = Vec::new();
    for &i in pending.iter() {
        match changes[i].kind {
            ChangeKind::Removed => removed.extend(changes[i].values.iter().cloned()),
            ChangeKind::Added => added.extend(changes[i].values.iter().cloned()),
            ChangeKind::Unchanged => {}
        }
    }

    match (removed.is_empty(), added.is_empty()) {
        (false, false) => {
            for &i in pending.iter() {
                let change = &mut changes[i];
                change.conflicted = true;
                change.conflict_group = Some(match change.kind {
                    ChangeKind::Removed => ConflictGroup::Former,
                    _ => ConflictGroup::Current,
                });
            }
            blocks.push(MergeBlock::conflict(removed, added));
        }
        (true, false) => blocks.push(MergeBlock::insertion(added)),
        (false, true) => blocks.push(MergeBlock::deletion(removed)),
        (true, true) => {}
    }

    pending.clear();
}

// ============================================================================
// Folding a new layer over existing blocks
// ============================================================================

/// What the next layer is diffed against: the rendered file with every
/// unsettled conflict contributing its current side.
#[derive(Debug, Clone, Default)]
pub struct BaseView {
    pub lines: Vec<String>,
    /// For each line, the index of the unsettled block it came from.
    pub origins: Vec<Option<usize>>,
}

impl BaseView {
    pub fn of(blocks: &[MergeBlock]) -> Self {
        let mut view = Self::default();
        for (index, block) in blocks.iter().enumerate() {
            let (lines, origin) = if block.is_unsettled() {
                (block.values.current.as_slice(), Some(index))
            } else {
                (block.settled_lines(), None)
            };
            view.lines.extend(lines.iter().cloned());
            view.origins.extend(std::iter::repeat_n(origin, lines.len()));
        }
        view
    }

    pub fn as_strs(&self) -> Vec<&str> {
        self.lines.iter().map(String::as_str).collect()
    }
}

/// Restore earlier unsettled conflicts that the new layer left untouched.
///
/// `rebuilt` is the block list from diffing `view` against the incoming
/// text. An unchanged block that fully covers the current side of an earlier
/// unsettled conflict gets that conflict back in place of those lines. A
/// changed block that overlaps earlier conflicts reopens against their former
/// sides, so the oldest content stays on the left.
pub fn carry_forward(
    previous: &[MergeBlock],
    view: &BaseView,
    rebuilt: Vec<MergeBlock>,
) -> Vec<MergeBlock> {
    let mut out = Vec::with_capacity(rebuilt.len());
    let mut cursor = 0;

    for block in rebuilt {
        let consumed = block.values.former.len();
        let is_plain_unchanged =
            !block.is_conflict() && !block.values.former.is_empty()
                && block.values.former == block.values.current;

        if !is_plain_unchanged {
            let origins = &view.origins[cursor..cursor + consumed];
            out.push(reopen(previous, origins, block));
            cursor += consumed;
            continue;
        }

        let origins = &view.origins[cursor..cursor + consumed];
        let mut start = 0;
        while start < origins.len() {
            let origin = origins[start];
            let mut end = start + 1;
            while end < origins.len() && origins[end] == origin {
                end += 1;
            }

            let lines = &block.values.former[start..end];
            match origin {
                Some(k) if previous[k].values.current.len() == end - start => {
                    out.push(previous[k].clone());
                }
                _ => out.push(MergeBlock::unchanged(lines.iter().cloned())),
            }
            start = end;
        }

        cursor += consumed;
    }

    out
}

/// Swap lines that came from earlier unsettled conflicts back to those
/// conflicts' former sides.
fn reopen(previous: &[MergeBlock], origins: &[Option<usize>], block: MergeBlock) -> MergeBlock {
    if origins.iter().all(Option::is_none) {
        return block;
    }

    let mut former = Vec::with_capacity(block.values.former.len());
    let mut seen = None;
    for (line, origin) in block.values.former.iter().zip(origins) {
        match origin {
            Some(k) if seen != Some(*k) => {
                former.extend(previous[*k].values.former.iter().cloned());
                seen = Some(*k);
            }
            Some(_) => {}
            None => {
                former.push(line.clone());
                seen = None;
            }
        }
    }

    let current = block.values.current;
    if former == current {
        MergeBlock::unchanged(former)
    } else if current.is_empty() {
        MergeBlock::deletion(former)
    } else {
        MergeBlock::conflict(former, current)
    }
}
