//! Cycle driver: discovery followed by one `collStats` per collection.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::coll_stats::{STATS_SCALE, decode};
use super::discovery::list_collections;
use super::traits::StatsSource;
use super::CollectError;
use crate::model::{CollectionId, CollectionSample, CollectionStats, SampleBatch};
use crate::suppress::LogSuppressor;

/// Builds one `SampleBatch` per call from a `StatsSource`.
///
/// Fetches run sequentially in discovery order. A failing collection is
/// reported and left out of the batch; the rest of the cycle proceeds.
pub struct CollStatsCollector<S: StatsSource> {
    source: S,
    suppressor: Arc<LogSuppressor>,
}

impl<S: StatsSource> CollStatsCollector<S> {
    /// Creates a collector.
    ///
    /// # Arguments
    /// * `source` - Database connection (live or mock)
    /// * `suppressor` - Process-wide fault warning gate shared with other collectors
    pub fn new(source: S, suppressor: Arc<LogSuppressor>) -> Self {
        Self { source, suppressor }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn suppressor(&self) -> &Arc<LogSuppressor> {
        &self.suppressor
    }

    /// Runs one cycle.
    ///
    /// Returns `None` when the database list cannot be read: the caller must
    /// not publish anything for this cycle.
    pub fn collect(&self) -> Option<SampleBatch> {
        let started = Instant::now();
        let ids = list_collections(&self.source, &self.suppressor).ok()?;

        let mut batch = SampleBatch::with_capacity(ids.len());
        let mut failed = 0usize;
        for id in ids {
            match self.fetch(&id) {
                Ok(stats) => {
                    self.suppressor.clear(&id.namespace());
                    batch.push(CollectionSample { id, stats });
                }
                Err(err) => {
                    failed += 1;
                    self.suppressor.report(&err);
                }
            }
        }

        debug!(
            collections = batch.len(),
            failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "collection stats cycle finished"
        );
        Some(batch)
    }

    /// Fetches and decodes stats for one collection.
    fn fetch(&self, id: &CollectionId) -> Result<CollectionStats, CollectError> {
        let raw = self
            .source
            .run_coll_stats(&id.database, &id.collection, STATS_SCALE)
            .map_err(|source| CollectError::Collection {
                id: id.clone(),
                source,
            })?;
        decode(raw).map_err(|source| CollectError::Decode {
            id: id.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockSource;
    use crate::suppress::DISCOVERY_KEY;
    use mongodb::bson::doc;

    fn collector(source: &MockSource) -> CollStatsCollector<&MockSource> {
        CollStatsCollector::new(source, Arc::new(LogSuppressor::new()))
    }

    #[test]
    fn typical_cluster_samples_user_collections_only() {
        let source = MockSource::typical_cluster();
        let batch = collector(&source).collect().unwrap();

        let names: Vec<String> = batch.iter().map(|s| s.id.namespace()).collect();
        assert_eq!(names, ["app.users", "app.orders", "analytics.daily_totals"]);
        // Internal namespaces are never even requested.
        assert_eq!(source.requests(), names);
    }

    #[test]
    fn decoded_sample_keeps_identity_and_values() {
        let source = MockSource::typical_cluster();
        let batch = collector(&source).collect().unwrap();

        let users = &batch[0];
        assert_eq!(users.id, CollectionId::new("app", "users"));
        assert_eq!(users.stats.count, Some(42.0));
        assert_eq!(users.stats.index_count(), Some(2.0));
        assert!(users.stats.wired_tiger.is_some());

        let view = &batch[2];
        assert!(view.stats.wired_tiger.is_none());
        assert_eq!(view.stats.storage_size, None);
    }

    #[test]
    fn discovery_failure_yields_no_batch() {
        let source = MockSource::typical_cluster();
        source.fail(DISCOVERY_KEY);

        let collector = collector(&source);
        assert!(collector.collect().is_none());
        assert!(source.requests().is_empty());
        assert!(!collector.suppressor().should_log(DISCOVERY_KEY));
    }

    #[test]
    fn failing_collection_is_excluded_and_cycle_continues() {
        let source = MockSource::typical_cluster();
        source.fail("app.users");

        let collector = collector(&source);
        let batch = collector.collect().unwrap();

        let names: Vec<String> = batch.iter().map(|s| s.id.namespace()).collect();
        assert_eq!(names, ["app.orders", "analytics.daily_totals"]);
        assert!(!collector.suppressor().should_log("app.users"));

        source.recover("app.users");
        assert_eq!(collector.collect().unwrap().len(), 3);
        assert!(collector.suppressor().is_empty());
    }

    #[test]
    fn undecodable_response_is_a_collection_fault() {
        let mut source = MockSource::new();
        source.add_collection("app", "users", doc! { "count": "lots" });
        source.add_collection("app", "orders", doc! { "count": 3_i32 });

        let collector = collector(&source);
        let batch = collector.collect().unwrap();

        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id.collection, "orders");
        assert!(!collector.suppressor().should_log("app.users"));
    }

    #[test]
    fn empty_deployment_yields_empty_batch() {
        let source = MockSource::new();
        assert_eq!(collector(&source).collect(), Some(Vec::new()));
    }
}
