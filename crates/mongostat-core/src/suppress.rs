//! Deduplication of repeated fault warnings.
//!
//! A persistent fault, such as a database without `listCollections` privilege,
//! would otherwise log the same warning every cycle. `LogSuppressor` turns
//! that stream into one warning per fault episode. The first failure for a
//! key logs and suppresses it. Later failures stay silent until the next
//! success for the key lifts suppression, so a future failure logs again.
//!
//! One instance is created per process and shared (`Arc`) by every call site
//! that reports faults.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use tracing::{info, warn};

use crate::collector::CollectError;

/// Fault key used when the database list itself cannot be read.
pub const DISCOVERY_KEY: &str = "";

/// Thread-safe set of currently suppressed fault keys.
#[derive(Debug, Default)]
pub struct LogSuppressor {
    keys: RwLock<HashSet<String>>,
}

impl LogSuppressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `key` is not currently suppressed.
    pub fn should_log(&self, key: &str) -> bool {
        !self
            .keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    /// Marks `key` as suppressed. Returns true if it was not suppressed before.
    pub fn suppress(&self, key: &str) -> bool {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string())
    }

    /// Lifts suppression for `key`. Returns true if it was suppressed.
    pub fn unsuppress(&self, key: &str) -> bool {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Number of keys currently suppressed.
    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports a fault, logging a warning only on the first failure of an episode.
    ///
    /// Returns true if a warning was emitted.
    pub fn report(&self, err: &CollectError) -> bool {
        // Check-and-insert under one write lock so concurrent reporters of the
        // same key cannot both log.
        if !self.suppress(&err.suppression_key()) {
            return false;
        }

        match err {
            CollectError::Discovery(_) => {
                warn!(error = %err, "collection stats will not be collected; suppressing further warnings")
            }
            CollectError::Database { database, .. } => warn!(
                database = %database, error = %err,
                "collection stats will not be collected for this database; suppressing further warnings"
            ),
            CollectError::Collection { id, .. } | CollectError::Decode { id, .. } => warn!(
                database = %id.database, collection = %id.collection, error = %err,
                "collection stats will not be collected for this collection; suppressing further warnings"
            ),
        }
        true
    }

    /// Records a success for `key`, ending its fault episode if one is open.
    pub fn clear(&self, key: &str) {
        // Fast path: almost every success concerns a key that never failed.
        if self.should_log(key) {
            return;
        }
        if self.unsuppress(key) {
            if key == DISCOVERY_KEY {
                info!("database listing recovered");
            } else {
                info!(key, "stats collection recovered");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::SourceError;
    use crate::model::CollectionId;
    use std::sync::Arc;

    fn collection_fault(db: &str, coll: &str) -> CollectError {
        CollectError::Collection {
            id: CollectionId::new(db, coll),
            source: SourceError::Unavailable("timeout".to_string()),
        }
    }

    #[test]
    fn suppress_and_unsuppress_toggle_membership() {
        let s = LogSuppressor::new();
        assert!(s.should_log("app"));
        assert!(s.suppress("app"));
        assert!(!s.suppress("app"));
        assert!(!s.should_log("app"));
        assert!(s.unsuppress("app"));
        assert!(!s.unsuppress("app"));
        assert!(s.should_log("app"));
    }

    #[test]
    fn repeated_failures_warn_once() {
        let s = LogSuppressor::new();
        let err = collection_fault("app", "users");

        let warnings = (0..5).filter(|_| s.report(&err)).count();
        assert_eq!(warnings, 1);
        assert!(!s.should_log("app.users"));
    }

    #[test]
    fn success_between_episodes_warns_again() {
        let s = LogSuppressor::new();
        let err = collection_fault("app", "users");

        let mut warnings = (0..3).filter(|_| s.report(&err)).count();
        s.clear("app.users");
        warnings += (0..3).filter(|_| s.report(&err)).count();

        assert_eq!(warnings, 2);
    }

    #[test]
    fn keys_are_independent() {
        let s = LogSuppressor::new();
        assert!(s.report(&collection_fault("app", "users")));
        assert!(s.report(&collection_fault("app", "orders")));
        assert!(s.report(&CollectError::Discovery(SourceError::Unavailable(
            "no primary".to_string()
        ))));
        assert_eq!(s.len(), 3);

        s.clear("app.orders");
        assert_eq!(s.len(), 2);
        assert!(!s.should_log(DISCOVERY_KEY));
    }

    #[test]
    fn clear_without_failure_is_noop() {
        let s = LogSuppressor::new();
        s.clear("app");
        assert!(s.is_empty());
    }

    #[test]
    fn concurrent_reports_warn_once() {
        let s = Arc::new(LogSuppressor::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|_| s.report(&collection_fault("app", "users")))
                        .count()
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 1);
    }
}
