//! CLI entry point for the labtrack-api HTTP service.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use labtrack_core::{LabtrackConfig, StoreBackend};
use labtrack_graph::{GraphClient, MemoryGraph};

use labtrack_api::{router, AppState};

#[derive(Parser)]
#[command(name = "labtrack-api")]
#[command(about = "HTTP service for tracking lab samples, processes, and splits")]
struct Cli {
    /// Config file prefix (default: labtrack).
    #[arg(short, long, default_value = "labtrack")]
    config: String,

    /// Listen address, overriding server.bind from config.
    #[arg(long)]
    bind: Option<String>,

    /// Use the in-memory store instead of Neo4j. Data is lost on exit.
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let mut config = LabtrackConfig::load(&cli.config)?;
    if cli.memory {
        config.store.backend = StoreBackend::Memory;
    }
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    let app = match config.store.backend {
        StoreBackend::Neo4j => {
            let graph = GraphClient::connect(&config.store).await?;
            graph.ensure_constraints().await?;
            router(AppState::new(Arc::new(graph), &config.split))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store");
            router(AppState::new(Arc::new(MemoryGraph::new()), &config.split))
        }
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        max_target_count = config.split.max_target_count,
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
