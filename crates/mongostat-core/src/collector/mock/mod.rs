//! In-memory `StatsSource` and prebuilt cluster scenarios for tests.

mod scenarios;
mod source;

pub use source::MockSource;
