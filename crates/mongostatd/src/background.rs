//! Collection loop: one cycle per interval, published to the exporter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use mongostat_core::collector::{CollStatsCollector, StatsSource};
use mongostat_core::exporter::CollStatsExporter;

use crate::metrics::CycleMetrics;

/// Runs one cycle. Returns the number of published collections, or `None`
/// when the cycle was skipped and the previous series stay published.
pub(crate) fn run_cycle<S: StatsSource>(
    collector: &CollStatsCollector<S>,
    exporter: &CollStatsExporter,
    metrics: &CycleMetrics,
) -> Option<usize> {
    let started = Instant::now();
    let published = collector.collect().map(|batch| {
        exporter.export(&batch);
        batch.len()
    });
    metrics.observe(started.elapsed(), published);
    published
}

/// Runs cycles until `running` is cleared.
pub(crate) fn collect_loop<S: StatsSource>(
    collector: &CollStatsCollector<S>,
    exporter: &CollStatsExporter,
    metrics: &CycleMetrics,
    interval: Duration,
    running: &AtomicBool,
) {
    info!(interval_s = interval.as_secs(), "starting collection loop");
    let mut published_count: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let t0 = Instant::now();
        match run_cycle(collector, exporter, metrics) {
            Some(collections) => {
                published_count += 1;
                if published_count == 1 {
                    info!(
                        collections,
                        duration_ms = t0.elapsed().as_millis() as u64,
                        "first batch published"
                    );
                } else {
                    debug!(
                        collections,
                        duration_ms = t0.elapsed().as_millis() as u64,
                        published_count,
                        "batch published"
                    );
                }
            }
            None => debug!("cycle skipped, previous series stay published"),
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("collection loop stopped");
}
