//! Document storage service
//!
//! Serves the document API and, optionally, the static editor front-end.
//! State lives in memory and is snapshotted to `<data-dir>/documents.json`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docstore_server::config::Config;
use docstore_server::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "docstore-server")]
#[command(about = "Markdown/LaTeX document storage service")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 3000, env = "PORT")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "DOCSTORE_BIND")]
    bind: String,

    /// Directory holding config.json and the document snapshot
    #[arg(long, default_value = "data", env = "DOCSTORE_DATA_DIR")]
    data_dir: PathBuf,

    /// Path prefix every route is served under (e.g. "/editor")
    #[arg(long, default_value = "", env = "BASE_URL")]
    base_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "docstore_server=info,docstore_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.data_dir)?;
    let state = Arc::new(AppState::open(&config, &cli.data_dir).await);

    let app = router(state, &config, &cli.base_url);

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;

    tracing::info!("Starting docstore-server on {}", addr);
    if !cli.base_url.is_empty() {
        tracing::info!("Base path: {}", cli.base_url);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("docstore-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
