//! # esdump
//!
//! Dumps Elasticsearch indices as JSON lines, using one sliced scroll per
//! index and parallel slices per scroll.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use esdump::config::DumpConfig;
//! use esdump::engine::DumpEngine;
//! use esdump::query::build_query;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> esdump::Result<()> {
//!     let config = DumpConfig::new("http://localhost", "logs-*")?.with_count(1000);
//!     config.validate()?;
//!
//!     let query = build_query(None, &config.query_options());
//!     let engine = DumpEngine::from_config(config)?;
//!     let stats = engine
//!         .dump(query, tokio::io::stdout(), &CancellationToken::new())
//!         .await?;
//!     eprintln!("dumped {} documents", stats.dumped);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              Engine                              │
//! │   discover indices → plan slices → scroll ∥ write → report       │
//! └──────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌───────────┬───────────┬───────┴───────┬────────────┬────────────┐
//! │ Discovery │   Query   │    Scroll     │   Output   │    HTTP    │
//! ├───────────┼───────────┼───────────────┼────────────┼────────────┤
//! │ _settings │ _source   │ Slices        │ JSONL      │ Transport  │
//! │ Shards    │ query     │ Throttle      │ Compaction │ TLS/gzip   │
//! │ Plan      │ Random    │ Record queue  │ Progress   │ Basic auth │
//! └───────────┴───────────┴───────────────┴────────────┴────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Dump configuration and flag value parsing
pub mod config;

/// HTTP transport
pub mod http;

/// Index discovery and slice planning
pub mod discovery;

/// Scroll request body construction
pub mod query;

/// Sliced scroll engine
pub mod scroll;

/// JSON lines output and progress reporting
pub mod output;

/// Dump pipeline
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
