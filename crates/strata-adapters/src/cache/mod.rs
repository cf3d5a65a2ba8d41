//! Patch cache stores.

mod directory;
mod memory;

pub use directory::DirectoryCacheStore;
pub use memory::MemoryCacheStore;
