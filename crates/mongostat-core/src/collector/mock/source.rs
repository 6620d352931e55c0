//! In-memory mock source for testing collectors without a live deployment.
//!
//! `MockSource` holds databases, collections and canned `collStats` responses,
//! and can be told to fail any call by fault key: the discovery key fails the
//! database listing, a database name fails its collection listing, and a
//! `db.collection` namespace fails that collection's stats request.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use mongodb::bson::Document;

use crate::collector::traits::{SourceError, StatsSource};
use crate::suppress::DISCOVERY_KEY;

#[derive(Debug, Clone)]
struct MockDatabase {
    name: String,
    collections: Vec<(String, Document)>,
}

/// In-memory MongoDB deployment.
#[derive(Debug, Default)]
pub struct MockSource {
    /// Databases in listing order.
    databases: Vec<MockDatabase>,
    /// Fault keys whose calls currently fail.
    failing: Mutex<HashSet<String>>,
    /// Namespaces passed to `run_coll_stats`, in call order.
    requests: Mutex<Vec<String>>,
}

impl MockSource {
    /// Creates an empty deployment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty database, keeping listing order.
    pub fn add_database(&mut self, name: &str) {
        if !self.databases.iter().any(|db| db.name == name) {
            self.databases.push(MockDatabase {
                name: name.to_string(),
                collections: Vec::new(),
            });
        }
    }

    /// Adds a collection with the raw `collStats` response it returns.
    ///
    /// The database is created if missing. Re-adding a collection replaces
    /// its response.
    pub fn add_collection(&mut self, database: &str, collection: &str, stats: Document) {
        self.add_database(database);
        let Some(db) = self.databases.iter_mut().find(|db| db.name == database) else {
            return;
        };
        match db.collections.iter_mut().find(|(name, _)| name == collection) {
            Some(entry) => entry.1 = stats,
            None => db.collections.push((collection.to_string(), stats)),
        }
    }

    /// Removes a collection, as if it was dropped.
    pub fn drop_collection(&mut self, database: &str, collection: &str) {
        if let Some(db) = self.databases.iter_mut().find(|db| db.name == database) {
            db.collections.retain(|(name, _)| name != collection);
        }
    }

    /// Makes every call scoped to `key` fail until `recover` is called.
    pub fn fail(&self, key: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string());
    }

    pub fn recover(&self, key: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Namespaces requested through `run_coll_stats` so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check(&self, key: &str) -> Result<(), SourceError> {
        let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        if failing.contains(key) {
            return Err(SourceError::Unavailable(format!("mock failure for {key:?}")));
        }
        Ok(())
    }

    fn database(&self, name: &str) -> Result<&MockDatabase, SourceError> {
        self.databases
            .iter()
            .find(|db| db.name == name)
            .ok_or_else(|| SourceError::Unavailable(format!("database {name} not found")))
    }
}

impl StatsSource for MockSource {
    fn list_database_names(&self) -> Result<Vec<String>, SourceError> {
        self.check(DISCOVERY_KEY)?;
        Ok(self.databases.iter().map(|db| db.name.clone()).collect())
    }

    fn list_collection_names(&self, database: &str) -> Result<Vec<String>, SourceError> {
        self.check(database)?;
        Ok(self
            .database(database)?
            .collections
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn run_coll_stats(
        &self,
        database: &str,
        collection: &str,
        _scale: i32,
    ) -> Result<Document, SourceError> {
        let namespace = format!("{database}.{collection}");
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(namespace.clone());
        self.check(&namespace)?;

        self.database(database)?
            .collections
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, stats)| stats.clone())
            .ok_or_else(|| SourceError::Unavailable(format!("ns not found: {namespace}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn lists_in_insertion_order() {
        let mut source = MockSource::new();
        source.add_collection("b", "x", doc! {});
        source.add_collection("a", "y", doc! {});
        source.add_collection("b", "z", doc! {});

        assert_eq!(source.list_database_names().unwrap(), ["b", "a"]);
        assert_eq!(source.list_collection_names("b").unwrap(), ["x", "z"]);
    }

    #[test]
    fn fail_and_recover_by_key() {
        let mut source = MockSource::new();
        source.add_collection("app", "users", doc! { "count": 1_i32 });

        source.fail("app.users");
        assert!(source.run_coll_stats("app", "users", 1).is_err());
        assert!(source.list_collection_names("app").is_ok());

        source.recover("app.users");
        let raw = source.run_coll_stats("app", "users", 1).unwrap();
        assert_eq!(raw.get_i32("count").unwrap(), 1);
        assert_eq!(source.requests(), ["app.users", "app.users"]);
    }

    #[test]
    fn dropped_collection_is_not_listed() {
        let mut source = MockSource::new();
        source.add_collection("app", "users", doc! {});
        source.add_collection("app", "orders", doc! {});
        source.drop_collection("app", "users");

        assert_eq!(source.list_collection_names("app").unwrap(), ["orders"]);
        assert!(source.run_coll_stats("app", "users", 1).is_err());
    }
}
