//! Layer sources: where template files come from.

mod directory;
mod retry;

pub use directory::DirectoryLayerSource;
pub use retry::RetryingSource;
