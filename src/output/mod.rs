//! Output module
//!
//! Consumes the record queue and writes JSON lines.
//!
//! # Overview
//!
//! - [`JsonlWriter`] writes one record per line, compacting multi-line
//!   records, and stops emitting once the record limit is met
//! - [`ProgressReporter`] logs dump progress periodically while a run is
//!   in flight

mod progress;
mod writer;

pub use progress::{ProgressReporter, PROGRESS_INTERVAL};
pub use writer::{compact_record, JsonlWriter};

#[cfg(test)]
mod tests;
