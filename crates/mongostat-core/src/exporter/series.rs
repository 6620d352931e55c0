//! Gauge families published by the exporter.

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};

pub(crate) const COLLECTION_LABELS: &[&str] = &["database", "collection"];
pub(crate) const INDEX_LABELS: &[&str] = &["database", "collection", "index"];
pub(crate) const TYPED_LABELS: &[&str] = &["database", "collection", "type"];

fn gauge_vec(
    namespace: &str,
    subsystem: &str,
    name: &str,
    help: &str,
    labels: &[&str],
) -> prometheus::Result<GaugeVec> {
    let opts = Opts::new(name, help)
        .namespace(namespace)
        .subsystem(subsystem);
    GaugeVec::new(opts, labels)
}

/// Collection-level series, reset at the start of every export.
pub(crate) struct CollectionSeries {
    pub size: GaugeVec,
    pub count: GaugeVec,
    pub avg_obj_size: GaugeVec,
    pub storage_size: GaugeVec,
    pub indexes: GaugeVec,
    pub indexes_size: GaugeVec,
    pub index_size: GaugeVec,
}

impl CollectionSeries {
    const SUBSYSTEM: &'static str = "db_coll";

    pub fn new(namespace: &str) -> prometheus::Result<Self> {
        let sub = Self::SUBSYSTEM;
        Ok(Self {
            size: gauge_vec(
                namespace,
                sub,
                "size",
                "The total size in memory of all records in a collection",
                COLLECTION_LABELS,
            )?,
            count: gauge_vec(
                namespace,
                sub,
                "count",
                "The number of objects or documents in this collection",
                COLLECTION_LABELS,
            )?,
            avg_obj_size: gauge_vec(
                namespace,
                sub,
                "avgobjsize",
                "The average size of an object in the collection (plus any padding)",
                COLLECTION_LABELS,
            )?,
            storage_size: gauge_vec(
                namespace,
                sub,
                "storage_size",
                "The total amount of storage allocated to this collection for document storage",
                COLLECTION_LABELS,
            )?,
            indexes: gauge_vec(
                namespace,
                sub,
                "indexes",
                "The number of indexes on the collection",
                COLLECTION_LABELS,
            )?,
            indexes_size: gauge_vec(
                namespace,
                sub,
                "indexes_size",
                "The total size of all indexes",
                COLLECTION_LABELS,
            )?,
            index_size: gauge_vec(
                namespace,
                sub,
                "index_size",
                "The individual index size",
                INDEX_LABELS,
            )?,
        })
    }

    fn all(&self) -> [&GaugeVec; 7] {
        [
            &self.size,
            &self.count,
            &self.avg_obj_size,
            &self.storage_size,
            &self.indexes,
            &self.indexes_size,
            &self.index_size,
        ]
    }

    pub fn reset(&self) {
        self.all().iter().for_each(|v| v.reset());
    }

    pub fn descs(&self) -> Vec<Desc> {
        descs(&self.all())
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        gather(&self.all())
    }
}

/// WiredTiger series, reset after every gather.
pub(crate) struct WiredTigerSeries {
    pub blocks_total: GaugeVec,
    pub cache_pages_total: GaugeVec,
    pub cache_bytes_total: GaugeVec,
    pub cache_evicted_total: GaugeVec,
    pub cache_bytes: GaugeVec,
    pub update_conflicts: GaugeVec,
    pub open_cursors: GaugeVec,
}

impl WiredTigerSeries {
    pub fn new(namespace: &str) -> prometheus::Result<Self> {
        let cache = "collection_wiredtiger_cache";
        Ok(Self {
            blocks_total: gauge_vec(
                namespace,
                "collection_wiredtiger_blockmanager",
                "blocks_total",
                "The total number of blocks allocated by the WiredTiger BlockManager",
                TYPED_LABELS,
            )?,
            cache_pages_total: gauge_vec(
                namespace,
                cache,
                "pages_total",
                "The total number of pages read into/from the WiredTiger Cache",
                TYPED_LABELS,
            )?,
            cache_bytes_total: gauge_vec(
                namespace,
                cache,
                "bytes_total",
                "The total number of bytes read into/from the WiredTiger Cache",
                TYPED_LABELS,
            )?,
            cache_evicted_total: gauge_vec(
                namespace,
                cache,
                "evicted_total",
                "The total number of pages evicted from the WiredTiger Cache",
                TYPED_LABELS,
            )?,
            cache_bytes: gauge_vec(
                namespace,
                cache,
                "bytes",
                "The current size of data in the WiredTiger Cache in bytes",
                TYPED_LABELS,
            )?,
            update_conflicts: gauge_vec(
                namespace,
                "collection_wiredtiger_transactions",
                "update_conflicts",
                "The number of conflicts updating transactions",
                COLLECTION_LABELS,
            )?,
            open_cursors: gauge_vec(
                namespace,
                "collection_wiredtiger_session",
                "open_cursors_total",
                "The total number of cursors opened in WiredTiger",
                COLLECTION_LABELS,
            )?,
        })
    }

    fn all(&self) -> [&GaugeVec; 7] {
        [
            &self.blocks_total,
            &self.cache_pages_total,
            &self.cache_bytes_total,
            &self.cache_evicted_total,
            &self.cache_bytes,
            &self.update_conflicts,
            &self.open_cursors,
        ]
    }

    pub fn reset(&self) {
        self.all().iter().for_each(|v| v.reset());
    }

    pub fn descs(&self) -> Vec<Desc> {
        descs(&self.all())
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        gather(&self.all())
    }
}

fn descs(vecs: &[&GaugeVec]) -> Vec<Desc> {
    vecs.iter()
        .flat_map(|v| v.desc().into_iter().cloned())
        .collect()
}

/// Collects every family that currently holds at least one series.
fn gather(vecs: &[&GaugeVec]) -> Vec<MetricFamily> {
    vecs.iter()
        .flat_map(|v| v.collect())
        .filter(|mf| !mf.get_metric().is_empty())
        .collect()
}

/// Sets a gauge only when the source reported a value.
pub(crate) fn set(vec: &GaugeVec, labels: &[&str], value: Option<f64>) {
    if let Some(value) = value {
        vec.with_label_values(labels).set(value);
    }
}
