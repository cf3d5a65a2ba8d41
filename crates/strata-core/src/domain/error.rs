// ============================================================================
// domain/error.rs - COMPOSITION AND MERGE INVARIANT ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (carried into outcomes and reports)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Composition Errors (fatal, raised before any merge work)
    // ========================================================================
    #[error("Unknown extension template '{label}' requested by answer '{question}'")]
    UnknownExtension { label: String, question: String },

    #[error("Extension chain did not reach a fixed point after {passes} passes")]
    NoFixedPoint { passes: usize },

    #[error("Unknown component '{name}'")]
    UnknownComponent { name: String },

    #[error("Alias collision in '{owner}': '{first}' and '{second}' both map to '{target}'")]
    AliasCollision {
        owner: String,
        first: String,
        second: String,
        target: String,
    },

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Duplicate {kind} '{name}' in template")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    // ========================================================================
    // Merge Invariant Errors (bugs, never recoverable by the caller)
    // ========================================================================
    #[error("Change sequence for '{path}' does not reconstruct the {side} side")]
    DiffInvariant { path: String, side: &'static str },

    #[error("Invalid job status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnknownExtension { label, question } => vec![
                format!("Answer '{question}' selected '__template.{label}'"),
                format!("Declare an [[extends]] entry with label = \"{label}\""),
                "Or remove the choice from the question".into(),
            ],
            Self::NoFixedPoint { passes } => vec![
                format!("Composition gave up after {passes} passes"),
                "Check for extension questions that keep selecting new templates".into(),
                "Raise generate.max_composition_passes if the chain is legitimately long".into(),
            ],
            Self::UnknownComponent { name } => vec![
                format!("No component named '{name}' is declared"),
                "Try: strata plan <TEMPLATE> to list available components".into(),
            ],
            Self::AliasCollision { target, .. } => vec![
                format!("Two entities would be written to '{target}'"),
                "Give each alias a distinct target path".into(),
            ],
            Self::InvalidPattern { pattern, .. } => vec![
                format!("Fix the glob '{pattern}' in template.toml"),
                "Patterns use glob syntax, e.g. \"src/**/*.rs\"".into(),
            ],
            Self::DiffInvariant { .. } | Self::InvalidStatusTransition { .. } => vec![
                "This is a bug in the merge engine".into(),
                "Please report it with the template that triggered it".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownExtension { .. }
            | Self::NoFixedPoint { .. }
            | Self::AliasCollision { .. }
            | Self::DuplicateName { .. } => ErrorCategory::Composition,
            Self::InvalidPattern { .. }
            | Self::InvalidTemplate(_)
            | Self::AbsolutePathNotAllowed { .. } => ErrorCategory::Validation,
            Self::UnknownComponent { .. } => ErrorCategory::NotFound,
            Self::DiffInvariant { .. } | Self::InvalidStatusTransition { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Composition,
    NotFound,
    Internal,
}
