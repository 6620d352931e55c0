//! Per-collection statistics collector for MongoDB.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   CollStatsCollector                     │
//! │  ┌───────────────────┐     ┌──────────────────────────┐  │
//! │  │    discovery      │     │      coll_stats          │  │
//! │  │  - listDatabases  │ ──► │  - collStats (scale 1)   │  │
//! │  │  - listCollections│     │  - decode → Collection-  │  │
//! │  │  - system filter  │     │    Stats                 │  │
//! │  └─────────┬─────────┘     └────────────┬─────────────┘  │
//! │            └──────────────┬─────────────┘                │
//! │                    ┌──────▼──────┐                       │
//! │                    │ StatsSource │ (trait)               │
//! │                    └──────┬──────┘                       │
//! └───────────────────────────┼──────────────────────────────┘
//!                   ┌─────────┴─────────┐
//!            ┌──────▼──────┐     ┌──────▼──────┐
//!            │ MongoSource │     │ MockSource  │
//!            │ (driver)    │     │ (testing)   │
//!            └─────────────┘     └─────────────┘
//! ```
//!
//! Faults never abort the process. A failed database listing skips the cycle,
//! a failed collection listing skips one database, and a failed fetch or decode
//! skips one collection. Each is reported through the shared `LogSuppressor`.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use mongostat_core::collector::{CollStatsCollector, MockSource};
//! use mongostat_core::suppress::LogSuppressor;
//!
//! let source = MockSource::typical_cluster();
//! let collector = CollStatsCollector::new(source, Arc::new(LogSuppressor::new()));
//! let batch = collector.collect().unwrap();
//! assert!(batch.iter().all(|s| s.id.database != "admin"));
//! ```

pub mod coll_stats;
#[allow(clippy::module_inception)]
mod collector;
pub mod discovery;
pub mod mock;
pub mod namespace;
pub mod traits;

pub use coll_stats::{DecodeError, STATS_SCALE, decode};
pub use collector::CollStatsCollector;
pub use discovery::list_collections;
pub use mock::MockSource;
pub use traits::{MongoSource, SourceError, StatsSource};

use crate::model::CollectionId;
use crate::suppress::DISCOVERY_KEY;

/// A fault handled within one collection cycle.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The database list could not be read; the cycle yields no samples.
    #[error("failed to list databases: {0}")]
    Discovery(#[source] SourceError),

    /// The collection list of one database could not be read.
    #[error("failed to list collections of {database}: {source}")]
    Database {
        database: String,
        #[source]
        source: SourceError,
    },

    /// `collStats` failed for one collection.
    #[error("failed to fetch stats for {id}: {source}")]
    Collection {
        id: CollectionId,
        #[source]
        source: SourceError,
    },

    /// `collStats` returned a response that could not be decoded.
    #[error("failed to decode stats for {id}: {source}")]
    Decode {
        id: CollectionId,
        #[source]
        source: DecodeError,
    },
}

impl CollectError {
    /// Key under which this fault is deduplicated in the `LogSuppressor`.
    pub fn suppression_key(&self) -> String {
        match self {
            CollectError::Discovery(_) => DISCOVERY_KEY.to_string(),
            CollectError::Database { database, .. } => database.clone(),
            CollectError::Collection { id, .. } | CollectError::Decode { id, .. } => id.namespace(),
        }
    }
}
