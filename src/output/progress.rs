//! Periodic progress logging

use crate::scroll::ScrollCounters;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Default interval between progress lines
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Background task logging progress until stopped
pub struct ProgressReporter {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    /// Start logging every `interval`
    pub fn spawn(counters: Arc<ScrollCounters>, max_records: u64, interval: Duration) -> Self {
        let stop = CancellationToken::new();
        let token = stop.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = token.cancelled() => return,
                    _ = ticker.tick() => report(&counters, max_records),
                }
            }
        });

        Self { stop, handle }
    }

    /// Stop the reporter and wait for it to exit
    pub async fn stop(self) {
        self.stop.cancel();
        let _ = self.handle.await;
    }
}

fn report(counters: &ScrollCounters, max_records: u64) {
    let snapshot = counters.snapshot(max_records);
    match (snapshot.total_hits, snapshot.percent) {
        (Some(total_hits), Some(percent)) => info!(
            dumped = snapshot.emitted,
            total_hits,
            progress = %format!("{percent:.2}%"),
            "dumping..."
        ),
        _ => info!(dumped = snapshot.emitted, "dumping..."),
    }
}
