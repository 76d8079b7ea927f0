//! wavedeck-mr - Metadata Resolver service
//!
//! Resolves production metadata for WAV working sets and mirrors organized
//! copies. The surrounding application (review UI, playback, undo/redo)
//! talks to this service over HTTP/JSON.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wavedeck_mr::AppState;

/// Command-line arguments for wavedeck-mr
#[derive(Parser, Debug)]
#[command(name = "wavedeck-mr")]
#[command(about = "Metadata Resolver service for WaveDeck")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5745", env = "WAVEDECK_MR_PORT")]
    port: u16,

    /// Root folder containing the audio working set
    #[arg(short, long, env = "WAVEDECK_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wavedeck_mr=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let root_folder = wavedeck_common::config::resolve_root_folder(
        args.root_folder.as_deref().and_then(|p| p.to_str()),
        "WAVEDECK_ROOT_FOLDER",
    );

    info!("Starting WaveDeck Metadata Resolver on port {}", args.port);
    info!("Root folder: {}", root_folder.display());
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&root_folder)
        .await
        .context("Failed to initialize root folder")?;

    let state = AppState::new(root_folder);
    let app = wavedeck_mr::build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
