use std::path::{Path, PathBuf};

use stats_core::settings::{Settings, StatsConfig, APP_DIR};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `<base>/.channel-stats/` exists and return it.
pub fn ensure_app_dir(base: &Path) -> anyhow::Result<PathBuf> {
    let app_dir = base.join(APP_DIR);
    std::fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name to an [`EnvFilter`] directive.
///
/// Unknown names are passed through so `RUST_LOG`-style directives work too.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber, writing to stderr.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;

    Ok(())
}

// ── Path resolution ────────────────────────────────────────────────────────────

/// Config and database locations for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub config: PathBuf,
    pub database: PathBuf,
}

impl ResolvedPaths {
    /// `true` when either path lives under `<base>/.channel-stats/`.
    pub fn uses_app_dir(&self, base: &Path) -> bool {
        let app_dir = base.join(APP_DIR);
        self.config.starts_with(&app_dir) || self.database.starts_with(&app_dir)
    }
}

/// Load the config file and resolve both paths against `base`.
pub fn resolve(settings: &Settings, base: &Path) -> (StatsConfig, ResolvedPaths) {
    let config_path = settings.config_path(base);
    let config = StatsConfig::load_from(&config_path);
    let database = settings.database_path(&config, base);
    (
        config,
        ResolvedPaths {
            config: config_path,
            database,
        },
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
