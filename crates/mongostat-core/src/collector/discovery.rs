//! Enumeration of the user collections to sample.

use tracing::debug;

use super::namespace::{is_system_collection, is_system_database};
use super::traits::StatsSource;
use super::CollectError;
use crate::model::CollectionId;
use crate::suppress::{DISCOVERY_KEY, LogSuppressor};

/// Lists every non-internal collection, in source order.
///
/// A database whose collections cannot be listed is reported and skipped.
/// Failing to list databases is returned as `CollectError::Discovery` after
/// being reported; the caller skips the cycle.
pub fn list_collections<S: StatsSource + ?Sized>(
    source: &S,
    suppressor: &LogSuppressor,
) -> Result<Vec<CollectionId>, CollectError> {
    let databases = match source.list_database_names() {
        Ok(names) => names,
        Err(e) => {
            let err = CollectError::Discovery(e);
            suppressor.report(&err);
            return Err(err);
        }
    };
    suppressor.clear(DISCOVERY_KEY);

    let mut ids = Vec::new();
    for database in databases {
        if is_system_database(&database) {
            continue;
        }

        let collections = match source.list_collection_names(&database) {
            Ok(names) => names,
            Err(e) => {
                suppressor.report(&CollectError::Database {
                    database,
                    source: e,
                });
                continue;
            }
        };
        suppressor.clear(&database);

        let before = ids.len();
        ids.extend(
            collections
                .into_iter()
                .filter(|name| !is_system_collection(name))
                .map(|name| CollectionId::new(database.as_str(), name)),
        );
        debug!(database = %database, collections = ids.len() - before, "database listed");
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockSource;
    use mongodb::bson::doc;

    #[test]
    fn excludes_internal_namespaces() {
        let mut source = MockSource::new();
        for db in ["admin", "config", "local"] {
            source.add_collection(db, "data", doc! {});
        }
        source.add_collection("app", "system.x", doc! {});
        source.add_collection("app", "users", doc! {});

        let suppressor = LogSuppressor::new();
        let ids = list_collections(&source, &suppressor).unwrap();
        assert_eq!(ids, vec![CollectionId::new("app", "users")]);
    }

    #[test]
    fn keeps_source_order() {
        let mut source = MockSource::new();
        source.add_collection("shop", "orders", doc! {});
        source.add_collection("shop", "carts", doc! {});
        source.add_collection("app", "users", doc! {});

        let ids = list_collections(&source, &LogSuppressor::new()).unwrap();
        let names: Vec<String> = ids.iter().map(CollectionId::namespace).collect();
        assert_eq!(names, ["shop.orders", "shop.carts", "app.users"]);
    }

    #[test]
    fn database_listing_failure_is_reported_once() {
        let source = MockSource::typical_cluster();
        source.fail(DISCOVERY_KEY);
        let suppressor = LogSuppressor::new();

        for _ in 0..3 {
            let err = list_collections(&source, &suppressor).unwrap_err();
            assert!(matches!(err, CollectError::Discovery(_)));
        }
        assert!(!suppressor.should_log(DISCOVERY_KEY));

        source.recover(DISCOVERY_KEY);
        assert!(list_collections(&source, &suppressor).is_ok());
        assert!(suppressor.should_log(DISCOVERY_KEY));
    }

    #[test]
    fn failing_database_is_skipped() {
        let mut source = MockSource::new();
        source.add_collection("broken", "a", doc! {});
        source.add_collection("app", "users", doc! {});
        source.fail("broken");

        let suppressor = LogSuppressor::new();
        let ids = list_collections(&source, &suppressor).unwrap();

        assert_eq!(ids, vec![CollectionId::new("app", "users")]);
        assert!(!suppressor.should_log("broken"));
        assert!(suppressor.should_log("app"));
    }
}
