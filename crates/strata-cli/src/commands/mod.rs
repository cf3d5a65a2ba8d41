//! Command handlers. Each turns parsed arguments into adapter and core
//! calls and reports through the [`OutputManager`](crate::output::OutputManager).

pub mod completions;
pub mod config;
pub mod generate;
pub mod init;
pub mod plan;
pub mod template;
