//! Prometheus exporter for per-collection statistics.
//!
//! `CollStatsExporter` turns a `SampleBatch` into labeled gauges and publishes
//! them for scraping.
//!
//! ## Reset-then-populate
//!
//! Every `export` clears all collection-level series before writing the new
//! batch, so a dropped collection or index disappears on the next export
//! instead of reporting its last value forever. WiredTiger series are cleared
//! again right after they are gathered.
//!
//! ## Publication
//!
//! Series are written under a writer mutex and gathered into metric families,
//! which are then swapped into the published snapshot. `collect()` only reads
//! the snapshot, so a scrape sees either the previous batch or the new one in
//! full, never a half-reset state.

mod series;
mod wiredtiger;

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;

use crate::model::CollectionSample;
use series::{CollectionSeries, WiredTigerSeries, set};

/// Default metric name prefix.
pub const DEFAULT_NAMESPACE: &str = "mongodb";

/// Exporter settings.
#[derive(Debug, Clone)]
pub struct ExporterOptions {
    /// Prefix of every metric name.
    pub namespace: String,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

struct Series {
    collection: CollectionSeries,
    wired_tiger: WiredTigerSeries,
}

struct Shared {
    descs: Vec<Desc>,
    series: Mutex<Series>,
    published: RwLock<Arc<Vec<MetricFamily>>>,
}

/// Publishes collection statistics as Prometheus gauges.
///
/// Cloning is cheap and every clone shares the same published state, so one
/// handle can be registered with a `prometheus::Registry` while another is fed
/// by the collection loop.
#[derive(Clone)]
pub struct CollStatsExporter {
    shared: Arc<Shared>,
}

impl CollStatsExporter {
    /// Creates an exporter. Fails if the namespace yields invalid metric names.
    pub fn new(options: &ExporterOptions) -> prometheus::Result<Self> {
        let series = Series {
            collection: CollectionSeries::new(&options.namespace)?,
            wired_tiger: WiredTigerSeries::new(&options.namespace)?,
        };
        let mut descs = series.collection.descs();
        descs.extend(series.wired_tiger.descs());

        Ok(Self {
            shared: Arc::new(Shared {
                descs,
                series: Mutex::new(series),
                published: RwLock::new(Arc::new(Vec::new())),
            }),
        })
    }

    /// Descriptors of every series this exporter can publish.
    ///
    /// The list is fixed at construction; repeated calls return the same set.
    pub fn describe(&self) -> Vec<&Desc> {
        self.shared.descs.iter().collect()
    }

    /// Replaces the published series with the contents of `batch`.
    pub fn export(&self, batch: &[CollectionSample]) {
        let series = self
            .shared
            .series
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        series.collection.reset();
        for sample in batch {
            export_collection(&series.collection, sample);
            if let Some(wired_tiger) = &sample.stats.wired_tiger {
                wiredtiger::export(&series.wired_tiger, &sample.id, wired_tiger);
            }
        }

        let mut families = series.collection.gather();
        families.extend(series.wired_tiger.gather());
        series.wired_tiger.reset();
        families.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        *self
            .shared
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(families);
    }

    /// The metric families published by the last `export`.
    pub fn snapshot(&self) -> Arc<Vec<MetricFamily>> {
        Arc::clone(
            &self
                .shared
                .published
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

impl Collector for CollStatsExporter {
    fn desc(&self) -> Vec<&Desc> {
        self.describe()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.snapshot().as_ref().clone()
    }
}

fn export_collection(series: &CollectionSeries, sample: &CollectionSample) {
    let (database, collection) = (sample.id.database.as_str(), sample.id.collection.as_str());
    let labels = [database, collection];
    let stats = &sample.stats;

    set(&series.size, &labels, stats.size);
    set(&series.count, &labels, stats.count);
    set(&series.avg_obj_size, &labels, stats.avg_obj_size);
    set(&series.storage_size, &labels, stats.storage_size);
    set(&series.indexes, &labels, stats.index_count());
    set(&series.indexes_size, &labels, stats.total_index_size);

    for (index, size) in stats.index_sizes.iter().flatten() {
        series
            .index_size
            .with_label_values(&[database, collection, index.as_str()])
            .set(*size);
    }
}
