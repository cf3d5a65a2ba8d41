//! Line-level diff engine.
//!
//! Produces an ordered sequence of [`Change`] runs between two line
//! sequences. Replaying the `unchanged` and `removed` runs yields the former
//! side; replaying `unchanged` and `added` yields the current side.
//!
//! Text is split on `\n` only, so `join_lines(split_lines(t)) == t` for any
//! `t`. A trailing newline shows up as an empty final line.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffOp, capture_diff_slices};

use crate::domain::error::DomainError;

/// Classification of a run of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Unchanged,
}

/// Which side of a conflict a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictGroup {
    Former,
    Current,
}

/// A run of lines sharing one [`ChangeKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub kind: ChangeKind,
    pub values: Vec<String>,
    /// Zero-based index of the first line on the side the run came from.
    /// `unchanged` runs anchor on the former side.
    pub line_number: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub conflicted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_group: Option<ConflictGroup>,
}

impl Change {
    fn new(kind: ChangeKind, line_number: usize, lines: &[&str]) -> Self {
        Self {
            kind,
            values: lines.iter().map(|l| (*l).to_string()).collect(),
            line_number,
            conflicted: false,
            conflict_group: None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `true` for `added` and `removed` runs.
    pub fn is_modification(&self) -> bool {
        self.kind != ChangeKind::Unchanged
    }
}

/// Split text into lines on `\n`, keeping everything else verbatim.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}

/// Inverse of [`split_lines`].
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line.as_ref());
    }
    out
}

/// Compute the change runs turning `former` into `current`.
///
/// Adjacent runs of the same kind are merged and, inside a replaced region,
/// removals always precede additions, so the partitioning is a pure function
/// of the inputs.
pub fn diff_lines(former: &[&str], current: &[&str]) -> Vec<Change> {
    let ops = capture_diff_slices(Algorithm::Myers, former, current);
    let mut changes: Vec<Change> = Vec::with_capacity(ops.len());

    for op in ops {
        match op {
            DiffOp::Equal { old_index, len, .. } => push_run(
                &mut changes,
                ChangeKind::Unchanged,
                old_index,
                &former[old_index..old_index + len],
            ),
            DiffOp::Delete {
                old_index, old_len, ..
            } => push_run(
                &mut changes,
                ChangeKind::Removed,
                old_index,
                &former[old_index..old_index + old_len],
            ),
            DiffOp::Insert {
                new_index, new_len, ..
            } => push_run(
                &mut changes,
                ChangeKind::Added,
                new_index,
                &current[new_index..new_index + new_len],
            ),
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                push_run(
                    &mut changes,
                    ChangeKind::Removed,
                    old_index,
                    &former[old_index..old_index + old_len],
                );
                push_run(
                    &mut changes,
                    ChangeKind::Added,
                    new_index,
                    &current[new_index..new_index + new_len],
                );
            }
        }
    }

    changes
}

fn push_run(changes: &mut Vec<Change>, kind: ChangeKind, anchor: usize, lines: &[&str]) {
    if lines.is_empty() {
        return;
    }
    if let Some(last) = changes.last_mut() {
        if last.kind == kind {
            last.values.extend(lines.iter().map(|l| (*l).to_string()));
            return;
        }
    }
    changes.push(Change::new(kind, anchor, lines));
}

/// Replay the former side (`unchanged` + `removed`).
pub fn replay_former(changes: &[Change]) -> Vec<&str> {
    replay(changes, ChangeKind::Removed)
}

/// Replay the current side (`unchanged` + `added`).
pub fn replay_current(changes: &[Change]) -> Vec<&str> {
    replay(changes, ChangeKind::Added)
}

fn replay(changes: &[Change], side: ChangeKind) -> Vec<&str> {
    changes
        .iter()
        .filter(|c| c.kind == ChangeKind::Unchanged || c.kind == side)
        .flat_map(|c| c.values.iter().map(String::as_str))
        .collect()
}

/// Number of added plus removed lines; zero means the sides are identical.
pub fn modify_length(changes: &[Change]) -> usize {
    changes
        .iter()
        .filter(|c| c.is_modification())
        .map(Change::len)
        .sum()
}

/// Check that `changes` reconstructs both inputs.
///
/// # Errors
///
/// [`DomainError::DiffInvariant`] naming the side that failed to replay.
pub fn verify_reconstruction(
    path: &str,
    changes: &[Change],
    former: &[&str],
    current: &[&str],
) -> Result<(), DomainError> {
    if replay_former(changes) != former {
        return Err(DomainError::DiffInvariant {
            path: path.to_string(),
            side: "former",
        });
    }
    if replay_current(changes) != current {
        return Err(DomainError::DiffInvariant {
            path: path.to_string(),
            side: "current",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kinds(changes: &[Change]) -> Vec<ChangeKind> {
        changes.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn split_and_join_are_inverse() {
        for text in ["", "a", "a\n", "a\nb", "\n\n", "x\r\ny\n"] {
            assert_eq!(join_lines(&split_lines(text)), text);
        }
    }

    #[test]
    fn identical_inputs_are_one_unchanged_run() {
        let lines = split_lines("a\nb\nc\n");
        let changes = diff_lines(&lines, &lines);

        assert_eq!(kinds(&changes), vec![ChangeKind::Unchanged]);
        assert_eq!(modify_length(&changes), 0);
    }

    #[test]
    fn single_line_replacement_removes_then_adds() {
        let changes = diff_lines(&[r#"{"a":1}"#], &[r#"{"a":2}"#]);

        assert_eq!(kinds(&changes), vec![ChangeKind::Removed, ChangeKind::Added]);
        assert_eq!(changes[0].values, vec![r#"{"a":1}"#]);
        assert_eq!(changes[1].values, vec![r#"{"a":2}"#]);
        assert_eq!(modify_length(&changes), 2);
    }

    #[test]
    fn appended_line_is_pure_addition() {
        let former = split_lines("a\nb\n");
        let current = split_lines("a\nb\nc\n");
        let changes = diff_lines(&former, &current);

        assert_eq!(
            kinds(&changes),
            vec![ChangeKind::Unchanged, ChangeKind::Added, ChangeKind::Unchanged]
        );
        assert_eq!(changes[1].values, vec!["c"]);
        assert_eq!(changes[1].line_number, 2);
    }

    #[test]
    fn empty_former_is_all_added() {
        let changes = diff_lines(&[], &["x", "y"]);
        assert_eq!(kinds(&changes), vec![ChangeKind::Added]);
        assert_eq!(changes[0].len(), 2);
    }

    #[test]
    fn verify_rejects_tampered_sequence() {
        let former = ["a", "b"];
        let current = ["a", "c"];
        let mut changes = diff_lines(&former, &current);
        changes.retain(|c| c.kind != ChangeKind::Added);

        let err = verify_reconstruction("f.txt", &changes, &former, &current).unwrap_err();
        assert_eq!(
            err,
            DomainError::DiffInvariant {
                path: "f.txt".into(),
                side: "current"
            }
        );
    }

    #[test]
    fn changes_round_trip_through_json() {
        let changes = diff_lines(&["a"], &["b"]);
        let json = serde_json::to_string(&changes).unwrap();
        assert!(!json.contains("conflicted"));
        let back: Vec<Change> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, changes);
    }

    proptest! {
        #[test]
        fn replay_reconstructs_both_sides(
            former in prop::collection::vec("[abc]{0,2}", 0..24),
            current in prop::collection::vec("[abc]{0,2}", 0..24),
        ) {
            let former: Vec<&str> = former.iter().map(String::as_str).collect();
            let current: Vec<&str> = current.iter().map(String::as_str).collect();
            let changes = diff_lines(&former, &current);

            prop_assert_eq!(replay_former(&changes), former.clone());
            prop_assert_eq!(replay_current(&changes), current.clone());
            prop_assert!(changes.iter().all(|c| !c.is_empty()));
            prop_assert!(changes.windows(2).all(|w| w[0].kind != w[1].kind));
        }

        #[test]
        fn diff_is_stable(
            former in prop::collection::vec("[ab]{1}", 0..16),
            current in prop::collection::vec("[ab]{1}", 0..16),
        ) {
            let former: Vec<&str> = former.iter().map(String::as_str).collect();
            let current: Vec<&str> = current.iter().map(String::as_str).collect();
            prop_assert_eq!(diff_lines(&former, &current), diff_lines(&former, &current));
        }
    }
}
