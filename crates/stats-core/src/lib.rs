//! Core types for channel statistics.
//!
//! Record shapes, the normalization primitives shared by ingestion and
//! aggregation, query parameters and their clamping ranges, configuration,
//! error types and number formatting.

pub mod error;
pub mod formatting;
pub mod models;
pub mod normalize;
pub mod query;
pub mod settings;
