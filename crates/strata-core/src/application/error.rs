//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Failure fetching template layers into staging.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Template not found: {locator}")]
    NotFound { locator: String },

    #[error("Timed out loading '{locator}' after {attempts} attempt(s)")]
    Timeout { locator: String, attempts: u32 },

    #[error("Failed to load '{locator}': {reason}")]
    Other { locator: String, reason: String },
}

impl LoadError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// A resolver failed on one conflict. Reported as a warning, never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ResolverError {
    pub message: String,
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// Loading template layers failed.
    #[error("Template load failed: {0}")]
    Load(#[from] LoadError),

    /// The answer provider could not answer a layer's questions.
    #[error("Could not collect answers for '{layer}': {reason}")]
    AnswersFailed { layer: String, reason: String },

    /// Persisting the patch cache failed.
    #[error("Cache error for '{label}': {reason}")]
    CacheFailed { label: String, reason: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Store access failed (lock poisoned, etc.).
    #[error("Store lock poisoned")]
    StoreLockError,

    /// Validation failed (application-level, not domain).
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Project already exists at target location.
    #[error("Project already exists at {path}")]
    ProjectExists { path: PathBuf },

    /// Rollback failed (best-effort cleanup failed).
    #[error("Rollback failed for {path}: {reason}")]
    RollbackFailed { path: PathBuf, reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Load(LoadError::NotFound { locator }) => vec![
                format!("Nothing found at: {locator}"),
                "Check the template path or name".into(),
                "A template directory needs a template.toml and a template/ folder".into(),
            ],
            Self::Load(LoadError::Timeout { .. }) => vec![
                "The template source did not respond in time".into(),
                "Raise loader.timeout_secs or loader.max_retries".into(),
            ],
            Self::AnswersFailed { .. } => vec![
                "Provide answers with --answer key=value or --answers <FILE>".into(),
                "Or run without --yes to answer interactively".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
                "Ensure the parent directory exists".into(),
            ],
            Self::StoreLockError => vec![
                "An internal store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::ProjectExists { path } => vec![
                format!("Directory already exists: {}", path.display()),
                "Use --upgrade to merge into the existing project".into(),
                "Or use --force to write over it".into(),
            ],
            Self::CacheFailed { .. } => vec![
                "The patch cache could not be read or written".into(),
                "Run with --no-cache, or clear the cache directory".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Load(LoadError::NotFound { .. }) => ErrorCategory::NotFound,
            Self::Load(_) => ErrorCategory::Io,
            Self::FilesystemError { .. } | Self::RollbackFailed { .. } => ErrorCategory::Io,
            Self::CacheFailed { .. } => ErrorCategory::Io,
            Self::StoreLockError => ErrorCategory::Internal,
            Self::AnswersFailed { .. } => ErrorCategory::Configuration,
            Self::ValidationFailed(_) | Self::ProjectExists { .. } => ErrorCategory::Validation,
        }
    }
}
