//! Self-metrics describing the collection loop.

use std::time::Duration;

use prometheus::{Gauge, IntCounterVec, IntGauge, Opts, Registry};

/// Gauges and counters updated once per collection cycle.
#[derive(Clone)]
pub(crate) struct CycleMetrics {
    duration: Gauge,
    cycles: IntCounterVec,
    collections: IntGauge,
}

impl CycleMetrics {
    pub fn new(namespace: &str) -> prometheus::Result<Self> {
        let opts = |name: &str, help: &str| {
            Opts::new(name, help)
                .namespace(namespace)
                .subsystem("collstats")
        };
        Ok(Self {
            duration: Gauge::with_opts(opts(
                "cycle_duration_seconds",
                "Duration of the last collection cycle",
            ))?,
            cycles: IntCounterVec::new(
                opts("cycles_total", "Collection cycles by outcome"),
                &["result"],
            )?,
            collections: IntGauge::with_opts(opts(
                "collections",
                "Collections in the last published batch",
            ))?,
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.duration.clone()))?;
        registry.register(Box::new(self.cycles.clone()))?;
        registry.register(Box::new(self.collections.clone()))?;
        Ok(())
    }

    /// Records one cycle. `published` is `None` when the cycle was skipped.
    pub fn observe(&self, elapsed: Duration, published: Option<usize>) {
        self.duration.set(elapsed.as_secs_f64());
        match published {
            Some(collections) => {
                self.cycles.with_label_values(&["ok"]).inc();
                self.collections.set(collections as i64);
            }
            None => self.cycles.with_label_values(&["skipped"]).inc(),
        }
    }

    #[cfg(test)]
    pub fn cycles(&self, result: &str) -> u64 {
        self.cycles.with_label_values(&[result]).get()
    }

    #[cfg(test)]
    pub fn collections(&self) -> i64 {
        self.collections.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_cycle_keeps_last_collection_count() {
        let metrics = CycleMetrics::new("mongodb").unwrap();
        metrics.observe(Duration::from_millis(20), Some(3));
        metrics.observe(Duration::from_millis(5), None);

        assert_eq!(metrics.cycles("ok"), 1);
        assert_eq!(metrics.cycles("skipped"), 1);
        assert_eq!(metrics.collections(), 3);
    }

    #[test]
    fn registers_under_namespace() {
        let metrics = CycleMetrics::new("mongodb").unwrap();
        let registry = Registry::new();
        metrics.register(&registry).unwrap();
        metrics.observe(Duration::from_millis(1), Some(0));

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|mf| mf.get_name().to_string())
            .collect();
        assert!(names.contains(&"mongodb_collstats_cycle_duration_seconds".to_string()));
        assert!(names.contains(&"mongodb_collstats_cycles_total".to_string()));
        assert!(names.contains(&"mongodb_collstats_collections".to_string()));
    }
}
