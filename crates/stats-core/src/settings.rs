use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Result, StatsError};
use crate::query::{QueryParams, RowLimits};

/// Directory under the home directory holding config and the default database.
pub const APP_DIR: &str = ".channel-stats";
/// File name of the default database inside [`APP_DIR`].
pub const DEFAULT_DATABASE_FILE: &str = "youtube.db";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Channel statistics ingestion and dashboard aggregates
#[derive(Parser, Debug, Clone)]
#[command(
    name = "channel-stats",
    about = "Channel statistics ingestion and dashboard aggregates",
    version
)]
pub struct Settings {
    /// SQLite database file (overrides the config file)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Normalize a CSV source and replace the stored table with it
    Ingest {
        /// Path to the CSV file
        source: PathBuf,
    },

    /// Compute the dashboard aggregates from the stored table
    Report {
        /// Size of the top-channel ranking
        #[arg(long, allow_negative_numbers = true)]
        num_channels: Option<i64>,

        /// Size of the country view-totals ranking
        #[arg(long, allow_negative_numbers = true)]
        num_countries: Option<i64>,

        /// Country for the leaderboard
        #[arg(long)]
        country: Option<String>,

        /// Output format
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Show the effective configuration
    Config {
        /// Write the built-in defaults to the config file
        #[arg(long)]
        write_defaults: bool,
    },
}

impl Settings {
    /// Log level after applying `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }

    /// Config file path: `--config` when given, otherwise the default under `home`.
    pub fn config_path(&self, home: &Path) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| StatsConfig::config_path_in(home))
    }

    /// Database path with precedence CLI flag > config file > default under `home`.
    pub fn database_path(&self, config: &StatsConfig, home: &Path) -> PathBuf {
        self.database
            .clone()
            .or_else(|| config.database.clone())
            .unwrap_or_else(|| StatsConfig::default_database_in(home))
    }

    /// Query parameters of a `report` command; defaults for anything else.
    pub fn query_params(&self) -> QueryParams {
        match &self.command {
            Command::Report {
                num_channels,
                num_countries,
                country,
                ..
            } => QueryParams {
                num_channels: *num_channels,
                num_countries: *num_countries,
                country: country.clone(),
            },
            _ => QueryParams::default(),
        }
    }
}

// ── StatsConfig ────────────────────────────────────────────────────────────────

/// Persisted configuration saved to `~/.channel-stats/config.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct StatsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    #[serde(default)]
    pub limits: RowLimits,
}

impl StatsConfig {
    /// Base directory the default paths are rooted at: the user's home, or
    /// the current directory when no home can be determined.
    pub fn home_base() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR).join("config.json")
    }

    /// Default database path rooted at `base_dir`.
    pub fn default_database_in(base_dir: &Path) -> PathBuf {
        base_dir.join(APP_DIR).join(DEFAULT_DATABASE_FILE)
    }

    /// Load the config from an explicit path.
    ///
    /// Returns `Default` when the file is absent, cannot be parsed, or holds
    /// inconsistent limits.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        let config: Self = match serde_json::from_str(&content) {
            Ok(c) => c,
            Err(e) => {
                warn!("Ignoring unparseable config {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Check that every range satisfies `min <= default <= max`.
    pub fn validate(&self) -> Result<()> {
        let ranges = [
            ("channels", &self.limits.channels),
            ("countries", &self.limits.countries),
        ];
        for (name, limit) in ranges {
            if !limit.is_consistent() {
                return Err(StatsError::Config(format!(
                    "limits.{} must satisfy min <= default <= max (got {}/{}/{})",
                    name, limit.min, limit.default, limit.max
                )));
            }
        }
        if self.limits.leaderboard_size == 0 {
            return Err(StatsError::Config(
                "limits.leaderboard_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Atomically write the config to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
