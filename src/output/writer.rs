//! JSON lines writer
//!
//! Clusters return `_source` exactly as it was indexed, newlines included.
//! Each record must fit on a single line, so multi-line records are
//! compacted before being written.

use crate::error::{Error, Result};
use crate::scroll::ScrollCounters;
use crate::types::Record;
use serde::de::IgnoredAny;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Strip insignificant whitespace from a record containing newlines
///
/// Records without a newline are returned untouched. Anything else must be
/// valid JSON.
pub fn compact_record(record: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !record.contains(&b'\n') {
        return Ok(Cow::Borrowed(record));
    }
    serde_json::from_slice::<IgnoredAny>(record)
        .map_err(|e| Error::decode(format!("compacting hit into single-line JSON: {e}")))?;

    let mut out = Vec::with_capacity(record.len());
    let mut in_string = false;
    let mut escaped = false;
    for &byte in record {
        if in_string {
            out.push(byte);
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
        } else if !matches!(byte, b' ' | b'\t' | b'\n' | b'\r') {
            in_string = byte == b'"';
            out.push(byte);
        }
    }
    Ok(Cow::Owned(out))
}

/// Writes records as JSON lines
pub struct JsonlWriter<W> {
    out: BufWriter<W>,
    counters: Arc<ScrollCounters>,
    max_records: u64,
}

impl<W: AsyncWrite + Unpin> JsonlWriter<W> {
    /// Create a writer; `max_records` of 0 means unlimited
    pub fn new(out: W, counters: Arc<ScrollCounters>, max_records: u64) -> Self {
        Self {
            out: BufWriter::new(out),
            counters,
            max_records,
        }
    }

    /// Drain `records` until the queue closes, returning how many were written
    ///
    /// Once the limit is met or `cancel` fires, records are still received
    /// but discarded so producers never block on a full queue.
    pub async fn run(
        mut self,
        mut records: mpsc::Receiver<Record>,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let mut written = 0;
        let mut stopped = false;

        while let Some(record) = records.recv().await {
            if stopped || cancel.is_cancelled() {
                continue;
            }

            self.write_record(&record).await?;
            written += 1;

            let emitted = self.counters.add_emitted(1);
            if self.max_records > 0 && emitted >= self.max_records {
                debug!(emitted, "record limit written, discarding the rest");
                stopped = true;
            }
        }

        self.out
            .flush()
            .await
            .inspect_err(|e| error!(error = %e, "flushing output"))?;
        Ok(written)
    }

    async fn write_record(&mut self, record: &[u8]) -> Result<()> {
        let line = compact_record(record)
            .inspect_err(|e| error!(error = %e, "compacting hit into single-line JSON"))?;
        self.out.write_all(&line).await?;
        self.out
            .write_u8(b'\n')
            .await
            .inspect_err(|e| error!(error = %e, "writing output"))?;
        Ok(())
    }
}
