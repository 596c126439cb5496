//! Bounded hand-off between slices and the output stage
//!
//! The queue capacity equals the page size: a slow writer stalls the
//! slices instead of letting pages pile up in memory.

use super::tracker::ScrollCounters;
use crate::error::{Error, Result};
use crate::types::Record;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Result of pushing one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Records delivered, limit not reached
    Accepted,
    /// The shared record limit is reached; the slice should stop
    LimitReached,
}

/// Producer side of the record queue
///
/// Every slice holds a clone. The queue closes when the last clone is
/// dropped, which the orchestrator does only after all slices finished.
#[derive(Debug, Clone)]
pub struct RecordSink {
    tx: mpsc::Sender<Record>,
    counters: Arc<ScrollCounters>,
    max_records: u64,
}

/// Create the record queue
pub fn record_channel(
    capacity: usize,
    counters: Arc<ScrollCounters>,
    max_records: u64,
) -> (RecordSink, mpsc::Receiver<Record>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        RecordSink {
            tx,
            counters,
            max_records,
        },
        rx,
    )
}

impl RecordSink {
    /// Whether the retrieved count already meets the maximum
    pub fn limit_reached(&self) -> bool {
        self.max_records > 0 && self.counters.retrieved() >= self.max_records
    }

    /// Push a whole page, one record at a time
    ///
    /// Nothing is pushed if the limit was already met. Otherwise the full
    /// page goes through, so the limit is a ceiling observed per page and
    /// concurrent slices may overshoot it slightly.
    pub async fn push_page(
        &self,
        records: Vec<Record>,
        cancel: &CancellationToken,
    ) -> Result<PushOutcome> {
        if self.limit_reached() {
            return Ok(PushOutcome::LimitReached);
        }

        let count = records.len() as u64;
        for record in records {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                sent = self.tx.send(record) => {
                    sent.map_err(|_| Error::output("record consumer stopped"))?;
                }
            }
        }

        let retrieved = self.counters.add_retrieved(count);
        if self.max_records > 0 && retrieved >= self.max_records {
            Ok(PushOutcome::LimitReached)
        } else {
            Ok(PushOutcome::Accepted)
        }
    }
}
