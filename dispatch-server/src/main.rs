//! dispatch-server - Main entry point
//!
//! HTTP service behind the dispatch slip scanner: stores parsed QR payloads,
//! serves history and recycle bin, and renders trip sheets.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dispatch_common::config::{RootFolderInitializer, RootFolderResolver, ServiceSettings, TomlConfig};
use dispatch_common::db::init_database;
use dispatch_server::{build_router, retention, AppState};
use tokio::signal;
use tracing::info;

const MODULE_NAME: &str = "dispatch-server";

/// Command-line arguments for dispatch-server
#[derive(Parser, Debug)]
#[command(name = "dispatch-server")]
#[command(about = "Dispatch slip scanning and trip sheet service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5000", env = "PORT")]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0", env = "DISPATCH_BIND")]
    bind: std::net::IpAddr,

    /// Folder holding dispatch.db and the Word template
    #[arg(short, long, env = "DISPATCH_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    info!(
        "Starting dispatch-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(args.root_folder.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path();
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("✓ Database ready: {}", db_path.display());

    let settings = ServiceSettings::from(&TomlConfig::load_or_default(MODULE_NAME));
    info!(
        bin_retention_days = settings.bin_retention_days,
        purge_interval_secs = settings.purge_interval_secs,
        list_limit = settings.list_limit,
        "Service settings loaded"
    );

    let _purge_task = retention::spawn_purge_task(pool.clone(), settings.clone());

    let state = AppState::new(pool, settings, initializer.template_path());
    let app = build_router(state);

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("dispatch-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
