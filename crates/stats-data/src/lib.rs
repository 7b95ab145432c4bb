//! Storage and computation layer for channel statistics.
//!
//! Reads tabular sources, persists the normalized table in SQLite and
//! computes the dashboard aggregates from whatever is stored.

pub mod aggregator;
pub mod analysis;
pub mod ingest;
pub mod reader;
pub mod store;

pub use stats_core as core;
