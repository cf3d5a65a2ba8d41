//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "generate a project" or "resolve conflicts".

pub mod cleanup;
pub mod composer;
pub mod conflicts;
pub mod generator;
pub mod materializer;
pub mod orchestrator;
pub mod patch_cache;
pub mod writer;

pub use cleanup::run_cleanups;
pub use composer::{Composition, DEFAULT_MAX_PASSES, TemplateComposer};
pub use conflicts::{ConflictProtocol, ResolutionReport, ResolverWarning};
pub use generator::{
    GenerateRequest, GenerationOutcome, GeneratorOptions, ProjectGenerator,
};
pub use materializer::materialize;
pub use orchestrator::{LayerReport, MergeOrchestrator};
pub use patch_cache::PatchCache;
pub use writer::{ResultWriter, WriteMode, WriteSummary};
