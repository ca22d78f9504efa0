use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use safepath_core::create_routing_context;
use safepath_server::{AppState, ServerConfig, build_router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "HTTP server for safety-weighted walking routes")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "safepath.toml")]
    config: PathBuf,

    /// Overrides the bind address from the configuration
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let mut config = ServerConfig::load(&args.config)?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }

    info!("Loading routing data from {}", config.model.graph_path.display());
    let model = config.model.clone();
    let context = tokio::task::spawn_blocking(move || create_routing_context(&model))
        .await
        .context("routing data loader panicked")?
        .context("building routing context")?;
    info!(
        nodes = context.graph().node_count(),
        edges = context.graph().edge_count(),
        skipped_features = context.feature_summary().skipped(),
        "routing context ready"
    );

    let state = Arc::new(AppState::new(context, config.model.clone()));
    let app = build_router(state, &config);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}
