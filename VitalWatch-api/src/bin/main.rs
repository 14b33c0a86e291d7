use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use vital_watch_api::api::{create_application, AppState};
use vital_watch_domain::auth::token_blacklist;
use vital_watch_domain::database;
use vital_watch_domain::events::EventBus;
use vital_watch_domain::scheduler::{self, SchedulerConfig};
use vital_watch_domain::services::create_default_services;

/// The main entry point for the VitalWatch API server
///
/// This function:
/// 1. Initializes environment variables from .env file
/// 2. Sets up tracing for logging
/// 3. Ensures the data directory exists and opens the database pool
/// 4. Wires the services and starts the background jobs
/// 5. Serves the Axum application until a shutdown signal arrives
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_ansi(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stdout),
        )
        .with(env_filter)
        .init();

    info!("Starting VitalWatch API server");

    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let db_path = PathBuf::from(&data_dir).join("vital_watch.db");

    if !PathBuf::from(&data_dir).exists() {
        info!("Creating data directory: {}", data_dir);
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir))?;
    }

    if std::env::var("DB_SQLITE_PATH").is_err() {
        std::env::set_var("DB_SQLITE_PATH", db_path.to_string_lossy().to_string());
        info!("Set DB_SQLITE_PATH to {}", db_path.display());
    }

    database::initialize_database_pool().context("failed to initialize database pool")?;
    if let Some(info) = database::get_connection_info() {
        info!("Database: {}", info);
    }

    let bus = EventBus::default();
    let services = create_default_services(bus).context("failed to create services")?;

    let cancel = CancellationToken::new();
    let mut background = scheduler::start(&services, SchedulerConfig::from_env(), cancel.clone());
    background.push(token_blacklist::start_cleanup_task(cancel.clone()));

    let app = create_application(AppState::new(services));

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .context("PORT must be a number")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cancel.cancel();
    for handle in background {
        if let Err(e) = handle.await {
            warn!("Background task ended abnormally: {}", e);
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on CTRL+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
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

    info!("Shutting down server...");
}
