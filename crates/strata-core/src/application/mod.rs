//! Application layer for Strata.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ProjectGenerator, ResultWriter)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! merge rules itself. Those live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{
    Composition, ConflictProtocol, GenerateRequest, GenerationOutcome, GeneratorOptions,
    LayerReport, MergeOrchestrator, PatchCache, ProjectGenerator, ResolutionReport,
    ResolverWarning, ResultWriter, TemplateComposer, WriteMode, WriteSummary,
};

// Re-export port traits (for adapter implementation)
pub use ports::{
    AnswerProvider, CacheStore, ConflictResolver, FetchOptions, Filesystem, GenerationObserver,
    LayerSource,
};

pub use error::{ApplicationError, LoadError, ResolverError};
