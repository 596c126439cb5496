//! Shared run counters
//!
//! Updated concurrently by every slice and by the output stage. Each counter
//! is independent, so plain atomics suffice and readers tolerate slightly
//! stale values.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Retrieved/emitted counts and total-hit aggregation across slices
#[derive(Debug, Default)]
pub struct ScrollCounters {
    retrieved: AtomicU64,
    emitted: AtomicU64,
    total_hits: AtomicU64,
    pending_slices: AtomicUsize,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// Records handed to the output stage
    pub retrieved: u64,
    /// Records written out
    pub emitted: u64,
    /// Sum of all slices' total hits, once every slice has reported
    pub total_hits: Option<u64>,
    /// Percentage of the expected output already written
    pub percent: Option<f64>,
}

impl ScrollCounters {
    /// Create counters expecting `slices` total-hit reports
    pub fn new(slices: usize) -> Self {
        Self {
            pending_slices: AtomicUsize::new(slices),
            ..Default::default()
        }
    }

    /// Reset the number of slices that still have to report
    pub fn expect_slices(&self, slices: usize) {
        self.pending_slices.store(slices, Ordering::SeqCst);
    }

    /// Record a slice's total hits; call once per slice
    pub fn report_total(&self, hits: u64) {
        self.total_hits.fetch_add(hits, Ordering::SeqCst);
        let _ = self
            .pending_slices
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| p.checked_sub(1));
    }

    /// Slices that haven't reported their total yet
    pub fn pending_slices(&self) -> usize {
        self.pending_slices.load(Ordering::SeqCst)
    }

    /// Total hits, defined only once every slice has reported
    pub fn total_hits(&self) -> Option<u64> {
        (self.pending_slices() == 0).then(|| self.total_hits.load(Ordering::SeqCst))
    }

    /// Add retrieved records, returning the new total
    pub fn add_retrieved(&self, n: u64) -> u64 {
        self.retrieved.fetch_add(n, Ordering::SeqCst) + n
    }

    /// Records handed to the output stage so far
    pub fn retrieved(&self) -> u64 {
        self.retrieved.load(Ordering::SeqCst)
    }

    /// Add emitted records, returning the new total
    pub fn add_emitted(&self, n: u64) -> u64 {
        self.emitted.fetch_add(n, Ordering::SeqCst) + n
    }

    /// Records written out so far
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::SeqCst)
    }

    /// Snapshot for progress reporting; `max_records` of 0 means unlimited
    pub fn snapshot(&self, max_records: u64) -> ProgressSnapshot {
        let emitted = self.emitted();
        let total_hits = self.total_hits();
        let percent = total_hits.map(|total| {
            let expected = if max_records > 0 {
                total.min(max_records)
            } else {
                total
            };
            if expected == 0 {
                100.0
            } else {
                emitted as f64 / expected as f64 * 100.0
            }
        });
        ProgressSnapshot {
            retrieved: self.retrieved(),
            emitted,
            total_hits,
            percent,
        }
    }
}
