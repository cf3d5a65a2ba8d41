//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `strata-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `LayerSource`: Fetch template layers into staging
//!   - `CacheStore`: Persist patch history between runs
//!   - `AnswerProvider`: Answer template questions
//!   - `ConflictResolver`: Decide merge conflicts
//!   - `GenerationObserver`: Status and progress callbacks
//!   - `Filesystem`: Write the generated project
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

#[cfg(test)]
pub use output::{
    MockAnswerProvider, MockCacheStore, MockConflictResolver, MockFilesystem, MockLayerSource,
};
pub use output::{
    AnswerProvider, CacheStore, ConflictResolver, FetchOptions, Filesystem, GenerationObserver,
    LayerSource,
};
