//! Scroll orchestration
//!
//! Runs every slice concurrently and reduces their outcomes:
//! - the first slice to reach the record limit stops everyone, cleanly
//! - the first failure stops everyone and becomes the run's error
//! - the caller's token firing is reported as [`Error::Cancelled`]
//!
//! Stopping uses a child of the caller's token, so an early stop never
//! looks like an external cancellation.

use super::sink::RecordSink;
use super::slice::{ScrollContext, SliceScroller};
use super::tracker::ScrollCounters;
use super::types::{ScrollConfig, SliceDescriptor, SliceOutcome};
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::types::QueryDocument;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Summary of a run that didn't fail
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollSummary {
    /// Number of slices run
    pub slices: usize,
    /// Slices that delivered all their hits
    pub exhausted: usize,
    /// Whether the record limit stopped the run
    pub limit_reached: bool,
    /// Records handed to the output stage
    pub retrieved: u64,
}

/// Fans the scroll out to one task per slice
pub struct ScrollOrchestrator {
    ctx: Arc<ScrollContext>,
    slices: Vec<SliceDescriptor>,
    sink: RecordSink,
}

/// Whatever stopped the run first
enum Stop {
    LimitReached,
    Failed(Error),
}

impl ScrollOrchestrator {
    /// Create an orchestrator over the given slices
    pub fn new(
        transport: Arc<dyn Transport>,
        query: QueryDocument,
        config: ScrollConfig,
        slices: Vec<SliceDescriptor>,
        sink: RecordSink,
        counters: Arc<ScrollCounters>,
    ) -> Self {
        counters.expect_slices(slices.len());
        Self {
            ctx: Arc::new(ScrollContext::new(transport, query, config, counters)),
            slices,
            sink,
        }
    }

    /// Scroll every slice, closing the record queue once all are done
    pub async fn run(self, cancel: &CancellationToken) -> Result<ScrollSummary> {
        let Self { ctx, slices, sink } = self;
        let stop_token = cancel.child_token();

        let mut summary = ScrollSummary {
            slices: slices.len(),
            ..Default::default()
        };
        info!(
            slices = slices.len(),
            timeout = %ctx.config().scroll_param(),
            size = ctx.config().page_size,
            throttle = ctx.config().throttle,
            "scrolling"
        );

        let mut tasks = JoinSet::new();
        for descriptor in slices {
            let scroller = SliceScroller::new(Arc::clone(&ctx), descriptor, sink.clone());
            tasks.spawn(scroller.run(stop_token.clone()));
        }

        let mut stop = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or_else(|e| {
                SliceOutcome::Failed(Error::Other(format!("slice task panicked: {e}")))
            });
            match outcome {
                SliceOutcome::Exhausted => summary.exhausted += 1,
                SliceOutcome::Cancelled => {}
                SliceOutcome::LimitReached => {
                    summary.limit_reached = true;
                    if stop.is_none() {
                        debug!("record limit reached, stopping all slices");
                        stop = Some(Stop::LimitReached);
                        stop_token.cancel();
                    }
                }
                SliceOutcome::Failed(e) => {
                    if stop.is_none() {
                        error!(error = %e, "slice failed, stopping all slices");
                        stop = Some(Stop::Failed(e));
                        stop_token.cancel();
                    } else {
                        debug!(error = %e, "discarding error after stop");
                    }
                }
            }
        }

        // Every slice is done: closing the sink ends the consumer's stream.
        drop(sink);
        summary.retrieved = ctx.counters().retrieved();

        match stop {
            Some(Stop::Failed(e)) => Err(e),
            Some(Stop::LimitReached) => Ok(summary),
            // A token fired during release doesn't undo a complete scroll.
            None if cancel.is_cancelled() && summary.exhausted < summary.slices => {
                Err(Error::Cancelled)
            }
            None => Ok(summary),
        }
    }
}
