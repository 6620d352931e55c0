//! Abstraction over the database connection to enable testing and mocking.
//!
//! The `StatsSource` trait lets the collector work against a live MongoDB
//! deployment or an in-memory `MockSource` in tests.

use std::sync::Arc;

use mongodb::bson::{Document, doc};
use mongodb::sync::Client;

/// Opaque fault raised by a `StatsSource` call.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    /// Failure reported by a non-driver source (mocks, fixtures).
    #[error("{0}")]
    Unavailable(String),
}

/// Read-only access to the statistics of a MongoDB deployment.
///
/// Every call is a single attempt; retries are left to the next cycle.
pub trait StatsSource: Send + Sync {
    /// Lists all database names visible to the connected user.
    fn list_database_names(&self) -> Result<Vec<String>, SourceError>;

    /// Lists collection names of one database.
    fn list_collection_names(&self, database: &str) -> Result<Vec<String>, SourceError>;

    /// Runs `collStats` for one collection and returns the raw response.
    ///
    /// # Arguments
    /// * `database` - Database holding the collection
    /// * `collection` - Collection name
    /// * `scale` - Scale factor applied by the server to size fields
    fn run_coll_stats(
        &self,
        database: &str,
        collection: &str,
        scale: i32,
    ) -> Result<Document, SourceError>;
}

impl<S: StatsSource + ?Sized> StatsSource for &S {
    fn list_database_names(&self) -> Result<Vec<String>, SourceError> {
        (**self).list_database_names()
    }

    fn list_collection_names(&self, database: &str) -> Result<Vec<String>, SourceError> {
        (**self).list_collection_names(database)
    }

    fn run_coll_stats(
        &self,
        database: &str,
        collection: &str,
        scale: i32,
    ) -> Result<Document, SourceError> {
        (**self).run_coll_stats(database, collection, scale)
    }
}

impl<S: StatsSource + ?Sized> StatsSource for Arc<S> {
    fn list_database_names(&self) -> Result<Vec<String>, SourceError> {
        (**self).list_database_names()
    }

    fn list_collection_names(&self, database: &str) -> Result<Vec<String>, SourceError> {
        (**self).list_collection_names(database)
    }

    fn run_coll_stats(
        &self,
        database: &str,
        collection: &str,
        scale: i32,
    ) -> Result<Document, SourceError> {
        (**self).run_coll_stats(database, collection, scale)
    }
}

/// Live source backed by the synchronous MongoDB driver.
///
/// Driver timeouts (`serverSelectionTimeoutMS`, `connectTimeoutMS`,
/// `socketTimeoutMS`) are taken from the connection string and bound every call.
#[derive(Clone, Debug)]
pub struct MongoSource {
    client: Client,
}

impl MongoSource {
    /// Creates a source from a connection string.
    ///
    /// The driver connects lazily, so an unreachable server surfaces as a
    /// discovery fault on the first cycle rather than here.
    pub fn connect(uri: &str) -> Result<Self, SourceError> {
        let client = Client::with_uri_str(uri)?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl StatsSource for MongoSource {
    fn list_database_names(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.client.list_database_names().run()?)
    }

    fn list_collection_names(&self, database: &str) -> Result<Vec<String>, SourceError> {
        Ok(self.client.database(database).list_collection_names().run()?)
    }

    fn run_coll_stats(
        &self,
        database: &str,
        collection: &str,
        scale: i32,
    ) -> Result<Document, SourceError> {
        let command = doc! { "collStats": collection, "scale": scale };
        Ok(self.client.database(database).run_command(command).run()?)
    }
}
