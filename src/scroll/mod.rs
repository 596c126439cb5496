//! Scroll module
//!
//! Parallel sliced scrolling of every document of one or more indices.
//!
//! # Overview
//!
//! - [`ScrollOrchestrator`] runs one [`SliceScroller`] per
//!   [`SliceDescriptor`] concurrently and turns their outcomes into a single
//!   run result
//! - [`SliceScroller`] drives one cursor through open, continue and release
//! - [`Throttle`] spaces requests in proportion to server latency
//! - [`ScrollCounters`] aggregates retrieved/emitted counts and total hits
//! - [`RecordSink`] is the bounded hand-off to the output stage
//!
//! # Cursor release
//!
//! Every cursor a slice opened is released when the slice ends, whatever
//! the reason. The release request runs under its own deadline
//! ([`RELEASE_TIMEOUT`]) and never observes the run's cancellation token,
//! so interrupting a dump still frees server-side scroll contexts.

mod orchestrator;
mod sink;
mod slice;
mod throttle;
mod tracker;
mod types;

pub use orchestrator::{ScrollOrchestrator, ScrollSummary};
pub use sink::{record_channel, PushOutcome, RecordSink};
pub use slice::{ScrollContext, SliceScroller, RELEASE_TIMEOUT};
pub use throttle::Throttle;
pub use tracker::{ProgressSnapshot, ScrollCounters};
pub use types::{HitFormat, ScrollConfig, ScrollPage, SliceDescriptor, SliceOutcome};
