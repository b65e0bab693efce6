use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modwatch::config::{Config, LoggingConfig};
use modwatch::metrics;
use modwatch::scheduler::Monitor;
use modwatch::storage::{create_sqlite_repository, ItemRepository};

#[derive(Parser)]
#[command(
    name = "modwatch",
    version,
    about = "Watch Steam Workshop mods for updates and post them to a webhook",
    long_about = None
)]
struct Cli {
    /// Run a single update check and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    setup_tracing(&config.logging);
    config.validate().context("Invalid configuration")?;

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!("Metrics initialization failed: {e}");
    }

    let repo = create_sqlite_repository(&config.storage.sqlite_path)
        .context("Failed to open state store")?;
    tracing::info!(
        path = %config.storage.sqlite_path.display(),
        records = repo.count().unwrap_or_default(),
        "State store ready"
    );

    let monitor = Arc::new(Monitor::from_config(&config, repo)?);

    if cli.once {
        tracing::info!("Running a single update check");
        let report = monitor.run_once().await?;
        tracing::info!(
            changed = report.changed,
            notified = report.notified,
            "Single update check complete"
        );
        if let Ok(text) = metrics::encode_metrics() {
            tracing::debug!(metrics = %text, "Final metrics");
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested, stopping after the current cycle");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                tracing::error!("Failed to listen for shutdown signal: {e}");
                // The loop also stops when this sender is dropped
                std::future::pending::<()>().await;
            }
        }
    });

    monitor.run_continuous(config.interval(), shutdown_rx).await;
    Ok(())
}

fn setup_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::new(format!("modwatch={},warn", logging.level));

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
