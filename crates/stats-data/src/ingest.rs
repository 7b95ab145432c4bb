//! Batch ingestion: CSV source to the persisted canonical table.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use stats_core::error::Result;
use stats_core::models::TABLE_NAME;
use stats_core::normalize::TableNormalizer;
use tracing::{debug, info};

use crate::reader::read_csv;
use crate::store::SqliteStore;

/// Outcome of one ingestion run, logged as the completion signal.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub table: String,
    /// Data rows read from the source.
    pub rows_read: usize,
    /// Rows written to storage.
    pub rows_stored: usize,
    /// Rows excluded for lacking a required field after coercion.
    pub rows_dropped: usize,
    /// Normalized names of source columns that matched no alias.
    pub unmapped_columns: Vec<String>,
    /// Set when the source could not be parsed and was treated as empty.
    pub malformed: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

/// Normalizes tabular sources and writes them through a [`SqliteStore`].
pub struct Ingestor<'a> {
    store: &'a SqliteStore,
    table: String,
}

impl<'a> Ingestor<'a> {
    /// Ingestor writing to the standard [`TABLE_NAME`].
    pub fn new(store: &'a SqliteStore) -> Self {
        Self {
            store,
            table: TABLE_NAME.to_string(),
        }
    }

    /// Write to a different table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Read `source`, normalize it and replace the stored table.
    ///
    /// 1. Parse the CSV permissively.
    /// 2. Normalize headers and resolve aliases.
    /// 3. Coerce subscriber and view counts.
    /// 4. Keep rows carrying all four canonical fields.
    /// 5. Replace the stored table in one transaction.
    ///
    /// Only a missing or unopenable source, or a storage failure, is an error.
    pub fn normalize_and_store(&self, source: &Path) -> Result<IngestReport> {
        let loaded = read_csv(source)?;

        let normalized = TableNormalizer::normalize(&loaded.table);
        let records = normalized.valid_records();
        let rows_read = normalized.row_count();
        debug!(
            "Normalized {} rows: {} valid, fields resolved: {:?}",
            rows_read,
            records.len(),
            normalized.resolved_fields
        );

        let rows_stored = self.store.replace_table(&self.table, &records)?;

        let report = IngestReport {
            source: source.to_path_buf(),
            destination: self.store.path().to_path_buf(),
            table: self.table.clone(),
            rows_read,
            rows_stored,
            rows_dropped: rows_read - rows_stored,
            unmapped_columns: normalized.unmapped_columns,
            malformed: loaded.malformed,
            loaded_at: Utc::now(),
        };

        info!(
            rows = report.rows_stored,
            dropped = report.rows_dropped,
            "Data loaded into {} (table: {})",
            report.destination.display(),
            report.table
        );

        Ok(report)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
