//! Domain value objects: JobStatus, QuestionKind.
//!
//! Pure value types with string representations and `FromStr` parsers.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ── JobStatus ────────────────────────────────────────────────────────────────

/// Lifecycle of a generation job. Moves forward only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
}

impl JobStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Finished => "finished",
        }
    }

    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running) | (Self::Running, Self::Finished)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "finished" | "done" => Ok(Self::Finished),
            other => Err(DomainError::InvalidTemplate(format!(
                "unknown job status: {other}"
            ))),
        }
    }
}

/// Job id to status, as published to observers.
pub type ContextStatusMap = BTreeMap<String, JobStatus>;

/// A single job and its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    id: String,
    status: JobStatus,
}

impl JobState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Advance the job and return the snapshot to publish.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidStatusTransition`] for anything but
    /// pending -> running -> finished.
    pub fn transition(&mut self, next: JobStatus) -> Result<ContextStatusMap, DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> ContextStatusMap {
        BTreeMap::from([(self.id.clone(), self.status)])
    }
}

// ── QuestionKind ─────────────────────────────────────────────────────────────

/// How a question is asked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    #[default]
    Input,
    Confirm,
    Select,
    #[serde(alias = "multiselect")]
    MultiSelect,
}

impl QuestionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Confirm => "confirm",
            Self::Select => "select",
            Self::MultiSelect => "multi-select",
        }
    }

    pub const fn has_choices(self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" | "text" => Ok(Self::Input),
            "confirm" | "bool" => Ok(Self::Confirm),
            "select" | "list" => Ok(Self::Select),
            "multi-select" | "multiselect" | "checkbox" => Ok(Self::MultiSelect),
            other => Err(DomainError::InvalidTemplate(format!(
                "unknown question kind: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_moves_forward_only() {
        let mut job = JobState::new("job-1");
        assert_eq!(job.status(), JobStatus::Pending);

        let snap = job.transition(JobStatus::Running).unwrap();
        assert_eq!(snap.get("job-1"), Some(&JobStatus::Running));

        assert!(job.transition(JobStatus::Pending).is_err());
        assert!(job.transition(JobStatus::Running).is_err());
        assert!(job.transition(JobStatus::Finished).is_ok());
        assert!(job.transition(JobStatus::Finished).is_err());
    }

    #[test]
    fn pending_cannot_skip_to_finished() {
        let mut job = JobState::new("j");
        let err = job.transition(JobStatus::Finished).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatusTransition { .. }));
    }

    #[test]
    fn question_kind_parses_aliases() {
        assert_eq!("checkbox".parse::<QuestionKind>().unwrap(), QuestionKind::MultiSelect);
        assert_eq!("LIST".parse::<QuestionKind>().unwrap(), QuestionKind::Select);
        assert!("slider".parse::<QuestionKind>().is_err());
    }
}
