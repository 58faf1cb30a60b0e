use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dropsort_core::{
    load_config_or_default, validate_config, Config, FolderStore, HistoryLedger, LogFormat,
    SortingEngine, SqliteFolderStore, SqliteHistoryLedger,
};
use dropsort_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let report = fatal_report(&e);
        // Config errors happen before a subscriber exists.
        if tracing::dispatcher::has_been_set() {
            error!("{}", report);
        } else {
            eprintln!("{report}");
        }
        std::process::exit(1);
    }
}

fn fatal_report(e: &anyhow::Error) -> String {
    format!("Fatal error: {e:#}")
}

/// Loads and validates the configuration; a missing file means defaults.
fn load_validated_config(path: &Path) -> Result<Config> {
    let config = load_config_or_default(path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("DROPSORT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    let config = load_validated_config(&config_path)?;

    init_logging(config.logging.format);

    if config_path.exists() {
        info!("Configuration loaded from {:?}", config_path);
    } else {
        warn!("No config file at {:?}, using defaults", config_path);
    }
    info!("Database path: {:?}", config.database.path);

    let folders: Arc<dyn FolderStore> = Arc::new(
        SqliteFolderStore::new(&config.database.path).context("Failed to open folder store")?,
    );
    let ledger: Arc<dyn HistoryLedger> = Arc::new(
        SqliteHistoryLedger::new(&config.database.path)
            .context("Failed to open history ledger")?,
    );
    info!("Stores initialized");

    let engine = Arc::new(SortingEngine::from_config(&config, folders, ledger));
    let resumed = engine
        .resume_monitoring()
        .await
        .context("Failed to resume monitoring")?;
    info!("{} folder watches active", resumed);

    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&engine)));
    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    engine.shutdown().await;
    info!("Folder watches stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
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
                error!("Failed to install SIGTERM handler: {}", e);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_config_report_names_the_cause() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 0\n").unwrap();

        let err = load_validated_config(&path).unwrap_err();
        let report = fatal_report(&err);

        assert!(report.starts_with("Fatal error: Configuration validation failed"));
        assert!(report.contains("port"), "{report}");
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_validated_config(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
