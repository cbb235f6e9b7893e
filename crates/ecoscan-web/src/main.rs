//! EcoScan Web - eDNA batch analysis over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use ecoscan_web::{create_router, load_settings, AppState};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ecoscan-web")]
#[command(version, about = "EcoScan Web - upload eDNA batches for anomaly screening")]
struct Cli {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Largest accepted upload in bytes
    #[arg(long)]
    max_upload_bytes: Option<usize>,

    /// Allowed CORS origin (repeatable; default allows any)
    #[arg(long = "allow-origin")]
    allow_origins: Vec<String>,

    /// Path to ecoscan.toml (default: search current and parent directories)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Flags override the config file
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(limit) = cli.max_upload_bytes {
        settings.server.max_upload_bytes = limit;
    }
    if !cli.allow_origins.is_empty() {
        settings.server.allowed_origins = cli.allow_origins;
    }

    let addr = settings.server.address();
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "EcoScan API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
