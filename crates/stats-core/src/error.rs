use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the channel statistics pipeline.
#[derive(Error, Debug)]
pub enum StatsError {
    /// The ingestion source file does not exist.
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    /// The ingestion source could not be parsed as a table.
    ///
    /// Ingestion degrades this to an empty canonical table; the variant exists
    /// so the reader can report what went wrong.
    #[error("Malformed source {path}: {reason}")]
    MalformedSource { path: PathBuf, reason: String },

    /// The persisted table is missing, corrupt or unreadable.
    #[error("Storage unavailable for table {table}: {reason}")]
    StorageUnavailable { table: String, reason: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StatsError {
    /// Shorthand for a [`StatsError::StorageUnavailable`] built from any displayable cause.
    pub fn storage(table: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        StatsError::StorageUnavailable {
            table: table.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the stats crates.
pub type Result<T> = std::result::Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_source_not_found() {
        let err = StatsError::SourceNotFound(PathBuf::from("/data/missing.csv"));
        assert_eq!(err.to_string(), "Source not found: /data/missing.csv");
    }

    #[test]
    fn test_error_display_malformed_source() {
        let err = StatsError::MalformedSource {
            path: PathBuf::from("stats.csv"),
            reason: "unterminated quote".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed source stats.csv: unterminated quote"
        );
    }

    #[test]
    fn test_error_storage_helper() {
        let err = StatsError::storage("youtube_stats", "no such table");
        assert!(matches!(err, StatsError::StorageUnavailable { .. }));
        assert_eq!(
            err.to_string(),
            "Storage unavailable for table youtube_stats: no such table"
        );
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StatsError::FileRead {
            path: PathBuf::from("/some/source.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/source.csv"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_error_display_config() {
        let err = StatsError::Config("limits.channels.min > max".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: limits.channels.min > max"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StatsError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: StatsError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
