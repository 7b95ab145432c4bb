//! Permissive CSV loading for the ingestion normalizer.
//!
//! Reads a tabular source into a [`RawTable`] without interpreting any
//! column. Undecodable bytes are dropped and a structurally broken file
//! degrades to an empty table instead of failing the run.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use stats_core::error::{Result, StatsError};
use stats_core::models::{CanonicalField, CellValue, RawTable};
use tracing::{debug, warn};

// ── Public API ────────────────────────────────────────────────────────────────

/// A loaded source plus the reason it was degraded, if it was.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub table: RawTable,
    /// Set when the source was malformed and replaced by an empty table.
    pub malformed: Option<String>,
}

/// Read the CSV file at `path`.
///
/// Fails with [`StatsError::SourceNotFound`] when the path does not exist
/// and [`StatsError::FileRead`] when it cannot be opened or read. Structural
/// problems are absorbed: see [`read_table`].
pub fn read_csv(path: &Path) -> Result<SourceTable> {
    if !path.exists() {
        return Err(StatsError::SourceNotFound(path.to_path_buf()));
    }

    let file = std::fs::File::open(path).map_err(|source| StatsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let loaded = read_table(file).map_err(|source| StatsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(reason) = &loaded.malformed {
        let err = StatsError::MalformedSource {
            path: path.to_path_buf(),
            reason: reason.clone(),
        };
        warn!("{}; continuing with an empty table", err);
    } else {
        debug!(
            "Read {} rows, {} columns from {}",
            loaded.table.len(),
            loaded.table.headers.len(),
            path.display()
        );
    }
    Ok(loaded)
}

/// Parse CSV from any reader.
///
/// * An empty source yields zero rows under the canonical column names.
/// * A header-only source yields zero rows under its own headers.
/// * Rows with too few or too many fields are padded or truncated.
/// * A structural CSV error yields an empty canonical table and a reason.
///
/// An I/O error from the reader is returned as is.
pub fn read_table<R: Read>(source: R) -> std::io::Result<SourceTable> {
    match parse(source) {
        Ok(table) => Ok(SourceTable {
            table,
            malformed: None,
        }),
        Err(e) => {
            let reason = e.to_string();
            match e.into_kind() {
                csv::ErrorKind::Io(io) => Err(io),
                _ => Ok(SourceTable {
                    table: empty_canonical(),
                    malformed: Some(reason),
                }),
            }
        }
    }
}

/// An empty table with the four canonical column names.
pub fn empty_canonical() -> RawTable {
    RawTable::with_headers(CanonicalField::ALL.map(CanonicalField::column_name))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse<R: Read>(source: R) -> std::result::Result<RawTable, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(source);

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let decoded = decode_lossy(h);
            if i == 0 {
                decoded.trim_start_matches('\u{feff}').to_string()
            } else {
                decoded
            }
        })
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Ok(empty_canonical());
    }

    let mut table = RawTable::with_headers(headers);
    for record in rdr.byte_records() {
        let record = record?;
        table.push_row(
            record
                .iter()
                .map(|field| CellValue::text(decode_lossy(field)))
                .collect(),
        );
    }

    Ok(table)
}

/// Decode bytes as UTF-8, dropping any sequence that is not valid.
fn decode_lossy(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).replace('\u{fffd}', ""),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn test_read_csv_missing_path() {
        let err = read_csv(Path::new("/tmp/does-not-exist-channel-stats.csv")).unwrap_err();
        assert!(matches!(err, StatsError::SourceNotFound(_)));
    }

    #[test]
    fn test_read_csv_basic() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "stats.csv",
            b"Youtuber,subscribers,video views,Country\nMrBeast,166000000,28368841870,United States\n",
        );

        let loaded = read_csv(&path).unwrap();
        assert!(loaded.malformed.is_none());
        assert_eq!(
            loaded.table.headers,
            vec!["Youtuber", "subscribers", "video views", "Country"]
        );
        assert_eq!(loaded.table.len(), 1);
        assert_eq!(
            loaded.table.rows[0][0],
            CellValue::Text("MrBeast".to_string())
        );
    }

    #[test]
    fn test_read_table_empty_source() {
        let loaded = read_table(&b""[..]).unwrap();
        assert!(loaded.malformed.is_none());
        assert!(loaded.table.is_empty());
        assert_eq!(
            loaded.table.headers,
            vec!["channel_name", "subscribers", "views", "country"]
        );
    }

    #[test]
    fn test_read_table_header_only() {
        let loaded = read_table(&b"Youtuber,Subs\n"[..]).unwrap();
        assert!(loaded.table.is_empty());
        assert_eq!(loaded.table.headers, vec!["Youtuber", "Subs"]);
    }

    #[test]
    fn test_read_table_invalid_utf8_is_dropped() {
        let loaded = read_table(&b"Youtuber,Country\nCaf\xe9 Music,Fran\xe7e\n"[..]).unwrap();
        assert_eq!(loaded.table.len(), 1);
        assert_eq!(
            loaded.table.rows[0],
            vec![
                CellValue::Text("Caf Music".to_string()),
                CellValue::Text("Frane".to_string())
            ]
        );
    }

    #[test]
    fn test_read_table_ragged_rows() {
        let loaded = read_table(&b"a,b,c\n1\n1,2,3,4\n"[..]).unwrap();
        assert_eq!(loaded.table.len(), 2);
        assert_eq!(loaded.table.rows[0][1], CellValue::Missing);
        assert_eq!(loaded.table.rows[1].len(), 3);
    }

    #[test]
    fn test_read_table_strips_bom_and_blank_cells() {
        let loaded = read_table(&b"\xef\xbb\xbfchannel,views\nA,\n"[..]).unwrap();
        assert_eq!(loaded.table.headers[0], "channel");
        assert_eq!(loaded.table.rows[0][1], CellValue::Missing);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "bad sector"))
        }
    }

    #[test]
    fn test_read_table_io_error_is_returned() {
        let err = read_table(FailingReader).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("bad sector"));
    }

    #[test]
    fn test_read_csv_directory_is_file_read_error() {
        let dir = TempDir::new().unwrap();
        let err = read_csv(dir.path()).unwrap_err();
        assert!(matches!(err, StatsError::FileRead { .. }));
    }

    #[test]
    fn test_read_table_quoted_thousands() {
        let loaded = read_table(&b"channel,views\n\"A, the channel\",\"1,234\"\n"[..]).unwrap();
        assert_eq!(
            loaded.table.rows[0],
            vec![
                CellValue::Text("A, the channel".to_string()),
                CellValue::Text("1,234".to_string())
            ]
        );
    }
}
