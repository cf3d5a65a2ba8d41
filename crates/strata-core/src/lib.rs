//! Strata Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for Strata, a
//! layered project generator: a template is a stack of file layers (main,
//! extensions, components) folded one over another, with line-level merge
//! for selected paths and a pluggable conflict resolver.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           strata-cli (CLI)              │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (ProjectGenerator, MergeOrchestrator)  │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (LayerSource, CacheStore, Resolver, ..) │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │     strata-adapters (Infrastructure)    │
//! │ (DirectoryLayerSource, stores, etc)     │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │  (Diff, MergeBlock, TemplateConfig)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use strata_core::prelude::*;
//!
//! let config = TemplateConfig::builder("app").merge("*.json").build()?;
//! let generator = ProjectGenerator::new(source, answers, resolver);
//! let outcome = generator.generate(&config, GenerateRequest {
//!     locator: "./templates/app".into(),
//!     ..GenerateRequest::default()
//! })?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        GenerateRequest, GenerationOutcome, GeneratorOptions, ProjectGenerator, ResultWriter,
        WriteMode,
        ports::{
            AnswerProvider, CacheStore, ConflictResolver, FetchOptions, Filesystem,
            GenerationObserver, LayerSource,
        },
    };
    pub use crate::domain::{
        Cleanup, ComponentConfig, Condition, ConflictSolveResult, ConflictSolverData,
        DeleteRule, ExtendTemplate, FileContent, GeneratorResult, MergeBlock, MergeTable, Props,
        Question, StagingArea, TemplateConfig,
    };
    pub use crate::error::{StrataError, StrataResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
