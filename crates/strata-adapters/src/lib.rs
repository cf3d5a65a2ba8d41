//! Infrastructure adapters for Strata.
//!
//! This crate implements the ports defined in `strata-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod answers;
pub mod cache;
pub mod filesystem;
pub mod manifest;
pub mod project;
pub mod resolvers;
pub mod source;

// Re-export commonly used adapters
pub use answers::{DefaultAnswers, StaticAnswers};
pub use cache::{DirectoryCacheStore, MemoryCacheStore};
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use manifest::{MANIFEST_FILE, ManifestLoader, TemplateManifest};
pub use project::read_existing_project;
pub use resolvers::{ResolverStrategy, StrategyResolver};
pub use source::{DirectoryLayerSource, RetryingSource};
