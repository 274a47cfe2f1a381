//! FHIR operation guard - entry point
//!
//! Connects to the document store and terminates client operations that run
//! longer than the configured timeout until SIGTERM/SIGINT.

use anyhow::Context;
use clap::Parser;
use fhirmongo::{background, config::Config, logging, metrics};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fhir-op-guard", version, about = "Kill long-running FHIR store operations")]
struct Args {
    /// Configuration file (defaults to ./config.{toml,yaml,json} when present)
    #[arg(short, long, env = "FHIR_GUARD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load_from(args.config.as_deref()).context("Failed to load configuration")?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let _telemetry_guard =
        logging::init_logging(&config.logging).context("Failed to initialize logging/telemetry")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.logging.deployment_environment,
        "Starting FHIR operation guard"
    );

    tracing::info!(
        namespace_suffix = config.guard.namespace_suffix,
        operation_timeout_seconds = config.guard.operation_timeout_seconds,
        admin_database = config.database.admin_database,
        "Configuration loaded"
    );

    let handle = background::start_op_guard(&config)
        .await
        .context("Failed to start operation guard")?;

    shutdown_signal().await;

    if let Some(handle) = handle {
        if let Err(e) = handle.stop().await {
            tracing::error!(error = %e, "Operation guard terminated unexpectedly");
            return Err(e.into());
        }
    }

    tracing::info!(counters = %metrics::render(), "Shutdown complete");
    Ok(())
}

/// Wait for SIGTERM (Docker) or SIGINT (Ctrl+C)
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler, waiting for SIGINT only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, stopping...");
        }
        _ = sigterm.recv() => {
            tracing::info!("SIGTERM received, stopping...");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for CTRL+C");
    }
    tracing::info!("Shutdown signal received, stopping...");
}
