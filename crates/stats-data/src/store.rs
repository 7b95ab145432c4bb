//! SQLite-backed persistence for the canonical table.
//!
//! [`SqliteStore`] is a handle on a database path. Each operation opens its
//! own connection and closes it before returning, so no connection state is
//! shared between ingestion and queries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use stats_core::error::{Result, StatsError};
use stats_core::models::{CanonicalRecord, CellValue, RawTable};
use tracing::debug;

/// Default busy timeout for every connection.
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Handle on one SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// `true` when the database file exists and holds a table named `table`.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let conn = self.open_read_only(table)?;
        let found = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| StatsError::storage(table, e))?;
        Ok(found.is_some())
    }

    /// Load every row and column of `table` as untyped cells.
    ///
    /// Columns are taken as stored; nothing is assumed about their names or
    /// types, so a table written by another tool loads just the same.
    pub fn load_table(&self, table: &str) -> Result<RawTable> {
        if !self.path.exists() {
            return Err(StatsError::storage(table, "database file does not exist"));
        }
        let conn = self.open_read_only(table)?;
        let to_err = |e: rusqlite::Error| StatsError::storage(table, e);

        let mut stmt = conn
            .prepare(&format!("SELECT * FROM {}", quote_ident(table)))
            .map_err(to_err)?;
        let headers: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = headers.len();

        let mut out = RawTable::with_headers(headers);
        let mut rows = stmt.query([]).map_err(to_err)?;
        while let Some(row) = rows.next().map_err(to_err)? {
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                cells.push(cell_from_sql(row.get_ref(idx).map_err(to_err)?));
            }
            out.push_row(cells);
        }

        debug!("Loaded {} rows from {}", out.len(), table);
        Ok(out)
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Replace `table` with `records` in a single transaction.
    ///
    /// Readers see either the previous table or the complete new one.
    /// Returns the number of rows written.
    pub fn replace_table(&self, table: &str, records: &[CanonicalRecord]) -> Result<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let to_err = |e: rusqlite::Error| StatsError::storage(table, e);
        let mut conn = Connection::open(&self.path).map_err(to_err)?;
        conn.busy_timeout(self.busy_timeout).map_err(to_err)?;

        let ident = quote_ident(table);
        let tx = conn.transaction().map_err(to_err)?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {ident};
             CREATE TABLE {ident} (
                 channel_name TEXT NOT NULL,
                 subscribers  REAL NOT NULL,
                 views        REAL NOT NULL,
                 country      TEXT NOT NULL
             );"
        ))
        .map_err(to_err)?;
        {
            let mut insert = tx
                .prepare(&format!(
                    "INSERT INTO {ident} (channel_name, subscribers, views, country)
                     VALUES (?1, ?2, ?3, ?4)"
                ))
                .map_err(to_err)?;
            for record in records {
                insert
                    .execute(params![
                        record.channel_name,
                        record.subscribers,
                        record.views,
                        record.country
                    ])
                    .map_err(to_err)?;
            }
        }
        tx.commit().map_err(to_err)?;

        debug!("Replaced {} with {} rows", table, records.len());
        Ok(records.len())
    }

    // ── Internal helpers ──────────────────────────────────────────────────

    fn open_read_only(&self, table: &str) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StatsError::storage(table, e))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| StatsError::storage(table, e))?;
        Ok(conn)
    }
}

/// Quote an SQL identifier, doubling any embedded quote.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn cell_from_sql(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Missing,
        ValueRef::Integer(i) => CellValue::Number(i as f64),
        ValueRef::Real(f) => CellValue::Number(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            CellValue::text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
