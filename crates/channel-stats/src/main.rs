mod bootstrap;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use stats_core::settings::{Command, Settings, StatsConfig};
use stats_data::analysis::AggregationEngine;
use stats_data::ingest::Ingestor;
use stats_data::store::SqliteStore;

fn main() -> Result<()> {
    let settings = Settings::parse();

    bootstrap::setup_logging(settings.effective_log_level())?;
    tracing::debug!("channel-stats v{} starting", env!("CARGO_PKG_VERSION"));

    let base = StatsConfig::home_base();
    let (config, paths) = bootstrap::resolve(&settings, &base);
    if paths.uses_app_dir(&base) {
        bootstrap::ensure_app_dir(&base)?;
    }
    tracing::debug!(
        "Config: {}, database: {}",
        paths.config.display(),
        paths.database.display()
    );

    let store = SqliteStore::new(&paths.database);

    match &settings.command {
        Command::Ingest { source } => {
            let report = Ingestor::new(&store)
                .normalize_and_store(source)
                .with_context(|| format!("Failed to ingest {}", source.display()))?;
            print!("{}", render::render_ingest(&report)?);
        }

        Command::Report { format, .. } => {
            let view = AggregationEngine::new(&store, config.limits)
                .compute_views(&settings.query_params());
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", render::render_view(&view)?);
            }
        }

        Command::Config { write_defaults } => {
            let config = if *write_defaults {
                let defaults = StatsConfig::default();
                defaults
                    .save_to(&paths.config)
                    .with_context(|| format!("Failed to write {}", paths.config.display()))?;
                tracing::info!("Wrote default config to {}", paths.config.display());
                defaults
            } else {
                config
            };
            let effective = StatsConfig {
                database: Some(paths.database.clone()),
                ..config
            };
            println!("# {}", paths.config.display());
            println!("{}", serde_json::to_string_pretty(&effective)?);
        }
    }

    Ok(())
}
