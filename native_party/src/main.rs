//! Main entry point for the watch party server.

use native_party::{cli, config, server};

use anyhow::Context;
use clap::Parser;
use config::Config;
use std::path::PathBuf;

/// Parse CLI args, load config and run the server.
///
/// Usage:
///   watch-party [--config PATH] [--port N] [--persist] [--debug]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::ServerCli::parse();

    // If debug is on: show everything at DEBUG level
    // If debug is off: show our crates at INFO, everything else at WARN/ERROR
    let log_filter = if cli.debug {
        "debug".to_string()
    } else {
        "native_party=info,party_shared=info,warn".to_string()
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(cli.debug)
        .with_thread_ids(cli.debug)
        .with_file(cli.debug)
        .with_line_number(cli.debug)
        .init();

    let config_path: PathBuf = cli.config.clone();

    // Load or create config file (creates file if missing).
    let mut cfg = Config::load_or_create(&config_path)
        .with_context(|| format!("loading or creating config '{}'", config_path.display()))?;

    // Apply CLI overrides in-memory (non-persistent by default)
    if cli.apply_overrides(&mut cfg) {
        cfg.validate().context("validating CLI overrides")?;
        if cli.persist {
            cfg.save(&config_path)
                .with_context(|| format!("saving updated config '{}'", config_path.display()))?;
        }
    }

    tracing::info!(
        config = %config_path.display(),
        rows = cfg.seating.row_seats.len(),
        stage_rows = cfg.seating.stage_rows,
        default_video = %cfg.default_video,
    );

    server::run_server(cfg).await
}
