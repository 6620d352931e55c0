//! Export of the WiredTiger sub-reports.
//!
//! Each sub-report is exported independently; an absent sub-report leaves its
//! series untouched for that collection.

use super::series::{WiredTigerSeries, set};
use crate::model::{
    BlockManagerStats, CacheStats, CollectionId, SessionStats, TransactionStats, WiredTigerStats,
};

fn typed<'a>(id: &'a CollectionId, kind: &'a str) -> [&'a str; 3] {
    [id.database.as_str(), id.collection.as_str(), kind]
}

pub(crate) fn export(series: &WiredTigerSeries, id: &CollectionId, stats: &WiredTigerStats) {
    if let Some(block_manager) = &stats.block_manager {
        export_block_manager(series, id, block_manager);
    }
    if let Some(cache) = &stats.cache {
        export_cache(series, id, cache);
    }
    if let Some(transaction) = &stats.transaction {
        export_transaction(series, id, transaction);
    }
    if let Some(session) = &stats.session {
        export_session(series, id, session);
    }
}

fn export_block_manager(series: &WiredTigerSeries, id: &CollectionId, stats: &BlockManagerStats) {
    set(&series.blocks_total, &typed(id, "freed"), stats.blocks_freed);
    set(&series.blocks_total, &typed(id, "allocated"), stats.blocks_allocated);
}

fn export_cache(series: &WiredTigerSeries, id: &CollectionId, stats: &CacheStats) {
    set(&series.cache_pages_total, &typed(id, "read"), stats.pages_read_into);
    set(&series.cache_pages_total, &typed(id, "written"), stats.pages_written_from);
    set(&series.cache_bytes_total, &typed(id, "read"), stats.bytes_read_into);
    set(&series.cache_bytes_total, &typed(id, "written"), stats.bytes_written_from);
    set(&series.cache_evicted_total, &typed(id, "modified"), stats.evicted_modified);
    set(&series.cache_evicted_total, &typed(id, "unmodified"), stats.evicted_unmodified);
    set(&series.cache_bytes, &typed(id, "total"), stats.bytes_total);
    set(&series.cache_bytes, &typed(id, "dirty"), stats.bytes_dirty);
}

fn export_transaction(series: &WiredTigerSeries, id: &CollectionId, stats: &TransactionStats) {
    let labels = [id.database.as_str(), id.collection.as_str()];
    set(&series.update_conflicts, &labels, stats.update_conflicts);
}

fn export_session(series: &WiredTigerSeries, id: &CollectionId, stats: &SessionStats) {
    let labels = [id.database.as_str(), id.collection.as_str()];
    set(&series.open_cursors, &labels, stats.open_cursors);
}
