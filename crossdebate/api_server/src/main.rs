use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossdebate_api::{build_router, AppState, ServerConfig};
use serde_json::json;
use shared_logging::{JsonLogger, LogLevel, LogRecord};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "crossdebate-api",
    version,
    about = "CrossDebate Engenharia backend: CSV uploads and simulated statistical analyses"
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the bind address.
    #[arg(long)]
    host: Option<String>,
    /// Overrides the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let state = AppState::from_config(&config).context("failed to build application state")?;
    let app = build_router(state, &config).context("failed to build router")?;

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    let local = listener.local_addr().context("failed to read bound address")?;
    tracing::info!(address = %local, origins = ?config.allowed_origins, "server listening");

    if let Some(dir) = &config.log_dir {
        let logger = JsonLogger::in_dir(dir, "api")?;
        logger.log(
            &LogRecord::new("api", LogLevel::Info, "server.started").with_metadata(json!({
                "address": local.to_string(),
                "version": env!("CARGO_PKG_VERSION"),
                "latency_scale": config.latency_scale,
                "max_tables": config.max_tables,
            })),
        )?;
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with an error")
}

fn resolve_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = ServerConfig::load(cli.config.as_deref())?;
    config
        .apply_env(|var| std::env::var(var).ok())
        .context("invalid environment override")?;
    if let Some(host) = &cli.host {
        config.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
