//! Pre-built mock deployments for testing.
//!
//! Responses mirror what a replica-set member running WiredTiger returns for
//! `collStats` with scale 1, trimmed to the fields the decoder reads plus a
//! few it must ignore.

use mongodb::bson::{Document, doc};

use super::source::MockSource;

#[allow(dead_code)]
impl MockSource {
    /// A typical deployment: the three system databases, an `app` database
    /// with two user collections and a `system.views` collection, and an
    /// `analytics` database holding a view (no storage-engine report).
    pub fn typical_cluster() -> Self {
        let mut source = Self::new();

        source.add_collection("admin", "system.version", wired_tiger_collection(2, 104));
        source.add_collection("config", "system.sessions", wired_tiger_collection(8, 99));
        source.add_collection("local", "startup_log", wired_tiger_collection(14, 1632));

        source.add_collection("app", "users", users_stats());
        source.add_collection("app", "orders", wired_tiger_collection(1200, 310));
        source.add_collection("app", "system.views", wired_tiger_collection(1, 120));

        source.add_collection(
            "analytics",
            "daily_totals",
            doc! {
                "ns": "analytics.daily_totals",
                "count": 31_i32,
                "size": 2_480_i32,
                "avgObjSize": 80_i32,
                "ok": 1.0,
            },
        );

        source
    }
}

/// `app.users`: two indexes and a full WiredTiger report.
fn users_stats() -> Document {
    doc! {
        "ns": "app.users",
        "size": 8_400_i32,
        "count": 42_i32,
        "avgObjSize": 200_i32,
        "storageSize": 16_384_i32,
        "freeStorageSize": 0_i32,
        "capped": false,
        "wiredTiger": {
            "metadata": { "formatVersion": 1_i32 },
            "creationString": "access_pattern_hint=none,allocation_size=4KB",
            "type": "file",
            "uri": "statistics:table:collection-0-8052214658237443845",
            "block-manager": {
                "blocks allocated": 30_i64,
                "blocks freed": 12_i64,
                "file size in bytes": 16_384_i64,
            },
            "cache": {
                "bytes currently in the cache": 9_811_i64,
                "bytes read into cache": 0_i64,
                "bytes written from cache": 8_772_i64,
                "modified pages evicted": 0_i64,
                "pages read into cache": 0_i64,
                "pages written from cache": 3_i64,
                "tracked dirty bytes in the cache": 0_i64,
                "unmodified pages evicted": 0_i64,
            },
            "session": { "open cursor count": 1_i64 },
            "transaction": { "update conflicts": 0_i64 },
        },
        "nindexes": 2_i32,
        "indexBuilds": [],
        "totalIndexSize": 36_864_i32,
        "totalSize": 53_248_i32,
        "indexSizes": { "_id_": 20_480_i32, "email_1": 16_384_i32 },
        "scaleFactor": 1_i32,
        "ok": 1.0,
    }
}

/// A collection with a single `_id_` index and a cache-only WiredTiger report.
fn wired_tiger_collection(count: i32, avg_obj_size: i32) -> Document {
    let size = i64::from(count) * i64::from(avg_obj_size);
    doc! {
        "size": size,
        "count": count,
        "avgObjSize": avg_obj_size,
        "storageSize": 4_096_i32,
        "wiredTiger": {
            "cache": {
                "bytes currently in the cache": size,
                "tracked dirty bytes in the cache": 0_i64,
            },
        },
        "nindexes": 1_i32,
        "totalIndexSize": 4_096_i32,
        "indexSizes": { "_id_": 4_096_i32 },
        "ok": 1.0,
    }
}
