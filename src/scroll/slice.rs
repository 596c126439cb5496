//! Slice scroller
//!
//! Drives one cursor for one slice of one index:
//!
//! ```text
//! Opening ──full──▶ Continuing ──full──▶ Continuing ...
//!    │                  │
//!    └─partial/limit────┴─partial/limit──▶ Exhausted ─┐
//!    └─error────────────┴─error──────────▶ Aborted ───┴─▶ release cursor
//! ```

use super::sink::{PushOutcome, RecordSink};
use super::throttle::Throttle;
use super::tracker::ScrollCounters;
use super::types::{ScrollConfig, ScrollPage, SliceDescriptor, SliceOutcome};
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::types::QueryDocument;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Deadline of a cursor release request, independent of the run
pub const RELEASE_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything slices of a run share
pub struct ScrollContext {
    transport: Arc<dyn Transport>,
    query: QueryDocument,
    config: ScrollConfig,
    scroll_param: String,
    throttle: Throttle,
    counters: Arc<ScrollCounters>,
}

impl ScrollContext {
    /// Create the shared context of a run
    pub fn new(
        transport: Arc<dyn Transport>,
        query: QueryDocument,
        config: ScrollConfig,
        counters: Arc<ScrollCounters>,
    ) -> Self {
        Self {
            transport,
            query,
            scroll_param: config.scroll_param(),
            throttle: Throttle::new(config.throttle, config.scroll_timeout),
            config,
            counters,
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Shared counters
    pub fn counters(&self) -> &Arc<ScrollCounters> {
        &self.counters
    }
}

/// Most recent cursor token issued to a slice
#[derive(Debug, Default)]
struct Cursor(Option<String>);

impl Cursor {
    /// Adopt a newly issued token; a response without one keeps the current
    fn advance(&mut self, token: Option<String>) {
        if token.is_some() {
            self.0 = token;
        }
    }
}

/// Scrolls one slice to completion
pub struct SliceScroller {
    ctx: Arc<ScrollContext>,
    descriptor: SliceDescriptor,
    sink: RecordSink,
}

impl SliceScroller {
    /// Create a scroller for one slice
    pub fn new(ctx: Arc<ScrollContext>, descriptor: SliceDescriptor, sink: RecordSink) -> Self {
        Self {
            ctx,
            descriptor,
            sink,
        }
    }

    /// Body of the open-scroll request
    pub fn open_body(&self) -> Result<String> {
        if !self.descriptor.is_sliced() {
            return Ok(serde_json::to_string(&self.ctx.query)?);
        }
        let mut query = self.ctx.query.clone();
        query.insert(
            "slice".to_string(),
            json!({ "id": self.descriptor.slice, "max": self.descriptor.total }),
        );
        Ok(serde_json::to_string(&query)?)
    }

    /// Body of a continuation request
    pub fn continue_body(&self, scroll_id: &str) -> String {
        json!({ "scroll": self.ctx.scroll_param, "scroll_id": scroll_id }).to_string()
    }

    /// Run the slice to completion, then release its cursor
    pub async fn run(self, cancel: CancellationToken) -> SliceOutcome {
        let mut cursor = Cursor::default();
        let outcome = self.scroll(&mut cursor, &cancel).await;
        self.release(cursor.0.take()).await;

        match &outcome {
            SliceOutcome::Exhausted => debug!(slice = %self.descriptor, "slice exhausted"),
            SliceOutcome::LimitReached => debug!(slice = %self.descriptor, "slice hit the record limit"),
            SliceOutcome::Cancelled => debug!(slice = %self.descriptor, "slice cancelled"),
            SliceOutcome::Failed(e) => debug!(slice = %self.descriptor, error = %e, "slice aborted"),
        }
        outcome
    }

    async fn scroll(&self, cursor: &mut Cursor, cancel: &CancellationToken) -> SliceOutcome {
        // Opening
        let mut started = Instant::now();
        let path = format!(
            "{}/_search?scroll={}",
            self.descriptor.index, self.ctx.scroll_param
        );
        let opened = match self.open_body() {
            Ok(body) => self.fetch_page(&path, body, cancel).await,
            Err(e) => Err(e),
        };
        // Reported before anything else can fail, so exactly once per slice.
        self.ctx
            .counters
            .report_total(opened.as_ref().map_or(0, |page| page.total_hits));
        let mut page = match opened {
            Ok(page) => page,
            Err(e) => return SliceOutcome::from_error(&self.descriptor, e),
        };

        // Continuing
        loop {
            cursor.advance(page.scroll_id.take());
            let full = page.records.len() == self.ctx.config.page_size;

            match self.sink.push_page(page.records, cancel).await {
                Ok(PushOutcome::Accepted) => {}
                Ok(PushOutcome::LimitReached) => return SliceOutcome::LimitReached,
                Err(e) => return SliceOutcome::from_error(&self.descriptor, e),
            }
            if !full {
                return SliceOutcome::Exhausted;
            }

            let Some(scroll_id) = cursor.0.as_deref() else {
                return SliceOutcome::from_error(
                    &self.descriptor,
                    Error::decode("full page without a scroll id"),
                );
            };
            let body = self.continue_body(scroll_id);

            if !self.ctx.throttle.pause(started.elapsed(), cancel).await {
                return SliceOutcome::Cancelled;
            }
            started = Instant::now();

            page = match self.fetch_page("_search/scroll", body, cancel).await {
                Ok(page) => page,
                Err(e) => return SliceOutcome::from_error(&self.descriptor, e),
            };
        }
    }

    async fn fetch_page(
        &self,
        path: &str,
        body: String,
        cancel: &CancellationToken,
    ) -> Result<ScrollPage> {
        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            sent = self.ctx.transport.get(path, Some(body)) => sent,
        };
        let response = sent
            .inspect_err(|e| error!(slice = %self.descriptor, error = %e, "sending scroll request"))?;

        if !response.is_ok() {
            error!(
                slice = %self.descriptor,
                code = response.status,
                response = %response.text(),
                "got unexpected status code"
            );
            return Err(Error::http_status(response.status, response.text()));
        }

        let page = self
            .ctx
            .config
            .hit_format
            .decode(&response.body)
            .inspect_err(|e| error!(slice = %self.descriptor, error = %e, "unmarshaling scroll response"))?;
        debug!(slice = %self.descriptor, hits = page.records.len(), "scroll page received");
        Ok(page)
    }

    /// Release the cursor under its own deadline
    ///
    /// Runs after the run may have been cancelled, so it must not observe the
    /// run's token. Failures are logged only.
    async fn release(&self, scroll_id: Option<String>) {
        let Some(scroll_id) = scroll_id else {
            return;
        };
        let path = format!("_search/scroll/{scroll_id}");

        match tokio::time::timeout(RELEASE_TIMEOUT, self.ctx.transport.delete(&path, None)).await {
            Ok(Ok(response)) if response.is_ok() => {
                debug!(slice = %self.descriptor, "scroll context cleared");
            }
            Ok(Ok(response)) => {
                error!(slice = %self.descriptor, code = response.status, "clearing scroll context");
            }
            Ok(Err(e)) => {
                error!(slice = %self.descriptor, error = %e, "clearing scroll context");
            }
            Err(_) => {
                warn!(slice = %self.descriptor, timeout = ?RELEASE_TIMEOUT, "clearing scroll context timed out");
            }
        }
    }
}
