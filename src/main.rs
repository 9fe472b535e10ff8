//! copd-risk: COPD risk prediction service
//!
//! Loads the artifacts once, then answers one JSON request per stdin line.

use std::io::IsTerminal;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use copd_risk::adapters::sanitize::SanitizingMakeWriter;
use copd_risk::config::{Config, LogMode};
use copd_risk::domain::CLINICAL_NOTICE;
use copd_risk::{session, PredictionService};

fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Stdout carries responses, so logs go to stderr or a file.
    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: a missing directory surfaces on open below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("opening log file {:?}", config.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Auto | LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(config.log_mode != LogMode::File && std::io::stderr().is_terminal())
                .with_writer(
                    SanitizingMakeWriter::new(writer).with_max_bytes(config.sanitize_max_bytes),
                ),
        )
        .init();

    tracing::info!("Starting copd-risk...");

    // Refuse to serve without a complete, verified artifact set.
    let store = config.artifact_store()?;
    let service = PredictionService::from_store(&store)
        .map_err(|e| anyhow!("Failed to load artifacts from {:?}: {e}", store.dir()))?
        .with_range_policy(config.range_policy);

    tracing::info!(
        policy = ?service.range_policy(),
        "Ready; model feature order: {}",
        service.feature_names().as_slice().join(", ")
    );
    eprintln!("{CLINICAL_NOTICE}");

    let summary = session::serve(&service, std::io::stdin().lock(), std::io::stdout().lock())?;

    tracing::info!(
        "copd-risk shutdown complete ({} served, {} failed).",
        summary.served,
        summary.failed
    );
    Ok(())
}
