//! Per-collection statistics decoded from the `collStats` command.
//!
//! Every numeric field is optional: the report varies by storage engine and
//! server version, and a missing field means "not exported", never zero.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Identifies one monitored collection within a single cycle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionId {
    pub database: String,
    pub collection: String,
}

impl CollectionId {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Fully-qualified `db.collection` name.
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Statistics for one collection as returned by `collStats` (scale 1).
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct CollectionStats {
    /// Number of documents.
    /// Source: `count`
    pub count: Option<f64>,

    /// Uncompressed size in memory of all records.
    /// Source: `size`
    pub size: Option<f64>,

    /// Average document size.
    /// Source: `avgObjSize`
    #[serde(rename = "avgObjSize")]
    pub avg_obj_size: Option<f64>,

    /// Storage allocated for documents.
    /// Source: `storageSize`
    #[serde(rename = "storageSize")]
    pub storage_size: Option<f64>,

    /// Sum of all index sizes.
    /// Source: `totalIndexSize`
    #[serde(rename = "totalIndexSize")]
    pub total_index_size: Option<f64>,

    /// Size of each index keyed by index name.
    /// Source: `indexSizes`
    #[serde(rename = "indexSizes")]
    pub index_sizes: Option<BTreeMap<String, f64>>,

    /// WiredTiger sub-report, absent on other storage engines and on views.
    /// Source: `wiredTiger`
    #[serde(rename = "wiredTiger")]
    pub wired_tiger: Option<WiredTigerStats>,
}

impl CollectionStats {
    /// Number of indexes, derived from the index-size mapping.
    pub fn index_count(&self) -> Option<f64> {
        self.index_sizes.as_ref().map(|sizes| sizes.len() as f64)
    }
}

/// The storage-engine report. Each sub-report is independently optional.
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct WiredTigerStats {
    #[serde(rename = "block-manager")]
    pub block_manager: Option<BlockManagerStats>,
    pub cache: Option<CacheStats>,
    pub transaction: Option<TransactionStats>,
    pub session: Option<SessionStats>,
}

/// Source: `wiredTiger.block-manager`
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct BlockManagerStats {
    #[serde(rename = "blocks freed")]
    pub blocks_freed: Option<f64>,
    #[serde(rename = "blocks allocated")]
    pub blocks_allocated: Option<f64>,
}

/// Source: `wiredTiger.cache`
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct CacheStats {
    /// Source: `bytes currently in the cache`
    #[serde(rename = "bytes currently in the cache")]
    pub bytes_total: Option<f64>,

    /// Source: `tracked dirty bytes in the cache`
    #[serde(rename = "tracked dirty bytes in the cache")]
    pub bytes_dirty: Option<f64>,

    #[serde(rename = "bytes read into cache")]
    pub bytes_read_into: Option<f64>,

    #[serde(rename = "bytes written from cache")]
    pub bytes_written_from: Option<f64>,

    #[serde(rename = "unmodified pages evicted")]
    pub evicted_unmodified: Option<f64>,

    #[serde(rename = "modified pages evicted")]
    pub evicted_modified: Option<f64>,

    #[serde(rename = "pages read into cache")]
    pub pages_read_into: Option<f64>,

    #[serde(rename = "pages written from cache")]
    pub pages_written_from: Option<f64>,
}

/// Source: `wiredTiger.transaction`
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct TransactionStats {
    #[serde(rename = "update conflicts")]
    pub update_conflicts: Option<f64>,
}

/// Source: `wiredTiger.session`
#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct SessionStats {
    #[serde(rename = "open cursor count")]
    pub open_cursors: Option<f64>,
}

/// One collection's statistics for one cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionSample {
    pub id: CollectionId,
    pub stats: CollectionStats,
}

/// All samples gathered by one discovery + fetch cycle, in discovery order.
pub type SampleBatch = Vec<CollectionSample>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_joins_with_dot() {
        let id = CollectionId::new("app", "users");
        assert_eq!(id.namespace(), "app.users");
        assert_eq!(id.to_string(), "app.users");
    }

    #[test]
    fn index_count_follows_index_sizes() {
        let mut stats = CollectionStats::default();
        assert_eq!(stats.index_count(), None);

        stats.index_sizes = Some(BTreeMap::from([
            ("_id_".to_string(), 100.0),
            ("byDate".to_string(), 250.0),
        ]));
        assert_eq!(stats.index_count(), Some(2.0));
    }
}
