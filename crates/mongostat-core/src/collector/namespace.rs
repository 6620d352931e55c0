//! Classification of internal databases and collections.
//!
//! Internal namespaces carry permission-restricted or high-cardinality
//! statistics and are never sampled.

/// Databases managed by the server itself.
const SYSTEM_DATABASES: &[&str] = &["admin", "config", "local"];

/// Prefix shared by server-managed collections in every database.
const SYSTEM_COLLECTION_PREFIX: &str = "system.";

/// Returns true for server-managed databases (and the empty name).
pub fn is_system_database(name: &str) -> bool {
    name.is_empty() || SYSTEM_DATABASES.contains(&name)
}

/// Returns true for `system.*` collections.
pub fn is_system_collection(name: &str) -> bool {
    name.starts_with(SYSTEM_COLLECTION_PREFIX)
}
