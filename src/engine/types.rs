//! Engine types

use std::time::Duration;

// ============================================================================
// Dump Stats
// ============================================================================

/// Statistics of a dump run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DumpStats {
    /// Wall time from the first scroll request to the final flush
    pub took: Duration,
    /// Records written to the output
    pub dumped: u64,
    /// Records retrieved from the cluster
    pub retrieved: u64,
    /// Slices scrolled
    pub slices: usize,
    /// Whether the record limit ended the run
    pub limit_reached: bool,
}

impl DumpStats {
    /// Documents written per second
    pub fn speed(&self) -> f64 {
        let secs = self.took.as_secs_f64();
        if secs > 0.0 {
            self.dumped as f64 / secs
        } else {
            0.0
        }
    }

    /// `took` rounded to the millisecond, for display
    pub fn took_rounded(&self) -> Duration {
        Duration::from_millis(((self.took.as_micros() + 500) / 1000) as u64)
    }
}
