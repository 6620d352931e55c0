//! Decoder for raw `collStats` responses.
//!
//! Scalars missing from the response stay `None`. The WiredTiger report and
//! each of its sub-reports may be absent independently; only a response whose
//! known fields have the wrong shape fails to decode.

use mongodb::bson::{self, Document};

use crate::model::CollectionStats;

/// Scale factor requested from the server: sizes are reported in bytes.
pub const STATS_SCALE: i32 = 1;

/// Malformed top-level `collStats` response.
#[derive(Debug, thiserror::Error)]
#[error("malformed collStats response: {0}")]
pub struct DecodeError(#[from] bson::de::Error);

/// Decodes one raw `collStats` response.
///
/// Numeric fields accept Int32, Int64 and Double and are converted to `f64`.
/// Unknown fields are ignored.
pub fn decode(raw: Document) -> Result<CollectionStats, DecodeError> {
    Ok(bson::from_document(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn decodes_scalars_of_mixed_numeric_types() {
        let raw = doc! {
            "ns": "app.users",
            "count": 42_i32,
            "size": 8_400_i64,
            "avgObjSize": 200.0_f64,
            "storageSize": 16_384_i64,
            "totalIndexSize": 350_i32,
            "nindexes": 2_i32,
            "ok": 1.0,
        };

        let stats = decode(raw).unwrap();
        assert_eq!(stats.count, Some(42.0));
        assert_eq!(stats.size, Some(8_400.0));
        assert_eq!(stats.avg_obj_size, Some(200.0));
        assert_eq!(stats.storage_size, Some(16_384.0));
        assert_eq!(stats.total_index_size, Some(350.0));
        assert!(stats.index_sizes.is_none());
        assert!(stats.wired_tiger.is_none());
    }

    #[test]
    fn missing_scalars_are_absent_not_zero() {
        let stats = decode(doc! { "count": 0_i32, "ok": 1.0 }).unwrap();
        assert_eq!(stats.count, Some(0.0));
        assert_eq!(stats.avg_obj_size, None);
        assert_eq!(stats.size, None);
    }

    #[test]
    fn null_scalar_is_absent() {
        let stats = decode(doc! { "avgObjSize": bson::Bson::Null }).unwrap();
        assert_eq!(stats.avg_obj_size, None);
    }

    #[test]
    fn decodes_index_sizes() {
        let stats = decode(doc! {
            "indexSizes": { "_id_": 100_i32, "byDate": 250_i64 },
        })
        .unwrap();

        let sizes = stats.index_sizes.unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes["_id_"], 100.0);
        assert_eq!(sizes["byDate"], 250.0);
    }

    #[test]
    fn decodes_full_wired_tiger_report() {
        let stats = decode(doc! {
            "wiredTiger": {
                "uri": "statistics:table:collection-7--123",
                "block-manager": { "blocks freed": 12_i64, "blocks allocated": 30_i64 },
                "cache": {
                    "bytes currently in the cache": 4096_i64,
                    "tracked dirty bytes in the cache": 512_i64,
                    "bytes read into cache": 9000_i64,
                    "bytes written from cache": 7000_i64,
                    "unmodified pages evicted": 3_i64,
                    "modified pages evicted": 4_i64,
                    "pages read into cache": 5_i64,
                    "pages written from cache": 6_i64,
                    "pages requested from the cache": 77_i64,
                },
                "transaction": { "update conflicts": 1_i32 },
                "session": { "open cursor count": 2_i32 },
            },
        })
        .unwrap();

        let wt = stats.wired_tiger.unwrap();
        let bm = wt.block_manager.unwrap();
        assert_eq!(bm.blocks_freed, Some(12.0));
        assert_eq!(bm.blocks_allocated, Some(30.0));

        let cache = wt.cache.unwrap();
        assert_eq!(cache.bytes_total, Some(4096.0));
        assert_eq!(cache.bytes_dirty, Some(512.0));
        assert_eq!(cache.bytes_read_into, Some(9000.0));
        assert_eq!(cache.bytes_written_from, Some(7000.0));
        assert_eq!(cache.evicted_unmodified, Some(3.0));
        assert_eq!(cache.evicted_modified, Some(4.0));
        assert_eq!(cache.pages_read_into, Some(5.0));
        assert_eq!(cache.pages_written_from, Some(6.0));

        assert_eq!(wt.transaction.unwrap().update_conflicts, Some(1.0));
        assert_eq!(wt.session.unwrap().open_cursors, Some(2.0));
    }

    #[test]
    fn tolerates_missing_sub_reports() {
        let stats = decode(doc! {
            "count": 1_i32,
            "wiredTiger": {
                "cache": { "bytes currently in the cache": 10_i64 },
            },
        })
        .unwrap();

        let wt = stats.wired_tiger.unwrap();
        assert!(wt.block_manager.is_none());
        assert!(wt.transaction.is_none());
        assert!(wt.session.is_none());
        let cache = wt.cache.unwrap();
        assert_eq!(cache.bytes_total, Some(10.0));
        assert_eq!(cache.bytes_dirty, None);
    }

    #[test]
    fn wrong_field_type_is_a_decode_fault() {
        let err = decode(doc! { "count": "many" }).unwrap_err();
        assert!(err.to_string().starts_with("malformed collStats response"));
    }
}
