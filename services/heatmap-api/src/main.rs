//! Heatmap API Server
//!
//! Aggregates weighted layers and synthesizes choropleths and heat fields
//! over a fixed overlay.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use heatmap_api::build_router;
use heatmap_api::config::{ServiceConfig, DEFAULT_MAX_BODY_BYTES};
use heatmap_api::metrics::install_recorder;
use heatmap_api::state::{prepare_mask, AppState};
use raster_engine::EngineConfig;

/// Heatmap API Server
#[derive(Parser, Debug)]
#[command(name = "heatmap-api")]
#[command(about = "Layer aggregation, choropleth and heat field server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8080", env = "HEATMAP_LISTEN_ADDR")]
    listen: String,

    /// Directory holding the overlay and layer maps
    #[arg(long, default_value = "./data", env = "HEATMAP_DATA_DIR")]
    data_dir: PathBuf,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env = "HEATMAP_MAX_BODY_BYTES")]
    max_body_bytes: usize,

    /// Convert this raw map image into the overlay mask, then exit
    #[arg(long, value_name = "SOURCE_PNG")]
    prepare_mask: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let config = ServiceConfig {
        data_dir: args.data_dir,
        max_body_bytes: args.max_body_bytes,
        engine: EngineConfig::from_env(),
    };

    if let Some(source) = args.prepare_mask {
        prepare_mask(&source, &config)?;
        return Ok(());
    }

    info!(data_dir = %config.data_dir.display(), "Starting heatmap API server");

    // Initialize Prometheus metrics exporter
    let metrics = install_recorder()?;

    let state = Arc::new(
        AppState::load(&config, metrics).context("Failed to initialize application state")?,
    );
    let app = build_router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("Heatmap API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
