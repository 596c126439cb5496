//! Dump engine module
//!
//! Wires discovery, the scroll engine and the output stage into one run.
//!
//! # Overview
//!
//! - `DumpEngine` - Runs a complete dump against one transport
//! - `DumpStats` - Figures reported at the end of a run
//!
//! The scroll orchestrator (producers) and the JSONL writer (consumer) run
//! concurrently and share one cancellation token derived from the caller's.
//! A writer failure cancels the scroll; the scroll closing the record queue
//! ends the writer.

mod types;

pub use types::DumpStats;

use crate::config::DumpConfig;
use crate::discovery::{discover_indices, plan_slices};
use crate::error::{Error, Result};
use crate::http::{HttpClient, Transport};
use crate::output::{JsonlWriter, ProgressReporter, PROGRESS_INTERVAL};
use crate::scroll::{record_channel, ScrollCounters, ScrollOrchestrator, ScrollSummary};
use crate::types::QueryDocument;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs dumps of one index target
pub struct DumpEngine {
    config: DumpConfig,
    transport: Arc<dyn Transport>,
    progress_interval: Duration,
}

impl DumpEngine {
    /// Create an engine over an existing transport
    pub fn new(config: DumpConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            progress_interval: PROGRESS_INTERVAL,
        }
    }

    /// Create an engine with an HTTP client built from the config
    pub fn from_config(config: DumpConfig) -> Result<Self> {
        let client = HttpClient::with_config(config.http_client_config())?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Set the progress logging interval
    #[must_use]
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// Dump every document matching `query` to `out` as JSON lines
    ///
    /// The final report is logged here whatever the outcome. A run stopped
    /// by `cancel` returns [`Error::Cancelled`].
    pub async fn dump<W>(
        &self,
        query: QueryDocument,
        out: W,
        cancel: &CancellationToken,
    ) -> Result<DumpStats>
    where
        W: AsyncWrite + Unpin,
    {
        let indices = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!("dump canceled during index discovery");
                return Err(Error::Cancelled);
            }
            found = discover_indices(self.transport.as_ref(), &self.config.target) => found?,
        };
        let slices = plan_slices(&indices, self.config.max_slices);

        let start = Instant::now();
        let scroll_config = self.config.scroll_config();
        let max_records = scroll_config.max_records;
        let counters = Arc::new(ScrollCounters::default());
        let (sink, records) =
            record_channel(scroll_config.page_size, Arc::clone(&counters), max_records);

        let orchestrator = ScrollOrchestrator::new(
            Arc::clone(&self.transport),
            query,
            scroll_config,
            slices,
            sink,
            Arc::clone(&counters),
        );
        let run_token = cancel.child_token();

        let writer = async {
            let written = JsonlWriter::new(out, Arc::clone(&counters), max_records)
                .run(records, &run_token)
                .await;
            if written.is_err() {
                run_token.cancel();
            }
            written
        };

        let progress =
            ProgressReporter::spawn(Arc::clone(&counters), max_records, self.progress_interval);
        let (scrolled, written) = tokio::join!(orchestrator.run(&run_token), writer);
        progress.stop().await;

        let result = match (scrolled, written) {
            (_, Err(e)) => Err(e),
            (Err(e), Ok(_)) => Err(e),
            (Ok(summary), Ok(_)) => Ok(summary),
        };

        let mut stats = DumpStats {
            took: start.elapsed(),
            dumped: counters.emitted(),
            retrieved: counters.retrieved(),
            ..Default::default()
        };
        if let Ok(ScrollSummary {
            slices,
            limit_reached,
            ..
        }) = &result
        {
            stats.slices = *slices;
            stats.limit_reached = *limit_reached;
        }
        report(&stats, result.as_ref().err());

        result.map(|_| stats)
    }
}

/// Log the final report of a run
fn report(stats: &DumpStats, failure: Option<&Error>) {
    let took = format!("{:?}", stats.took_rounded());
    let speed = format!("{:.2} docs/sec", stats.speed());

    match failure {
        None => info!(took = %took, dumped = stats.dumped, speed = %speed, "dump complete"),
        Some(e) if e.is_cancelled() => warn!(
            took = %took,
            dumped = stats.dumped,
            speed = %speed,
            "dump canceled before completion"
        ),
        Some(e) => error!(
            took = %took,
            dumped = stats.dumped,
            speed = %speed,
            error = %e,
            "dump failed"
        ),
    }
}
