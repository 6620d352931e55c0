//! mongostat-core: per-collection MongoDB statistics for Prometheus.
//!
//! Provides:
//! - `collector`: collection discovery, `collStats` fetching and decoding
//! - `model`: decoded statistics and collection identities
//! - `exporter`: reset-then-populate publication as labeled gauges
//! - `suppress`: one-warning-per-episode fault logging

pub mod collector;
pub mod exporter;
pub mod model;
pub mod suppress;

/// Crate version, shared by the daemon's `--version` output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
