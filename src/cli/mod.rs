//! CLI module
//!
//! Command-line interface for dumping an index.
//!
//! ```text
//! esdump base-url index-target [flags]
//! ```

mod commands;
mod runner;

pub use commands::Cli;
pub use runner::Runner;
