//! orderfeed client daemon
//!
//! Keeps one order view in sync: initial load, push wake-ups through the
//! local relay, and the restaurant live feed. Runs until Ctrl-C.

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use orderfeed_core::config::AppConfig;
use orderfeed_core::error::AppError;
use orderfeed_push::NonInteractivePrompt;
use orderfeed_realtime::ClientApp;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Client error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("ORDERFEED_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    AppConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_ansi(config.logging.ansi)
                .with_target(true)
                .init();
        }
    }
}

/// Main client run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting orderfeed v{}", env!("CARGO_PKG_VERSION"));

    // The daemon has no terminal; an unanswered permission stays unanswered.
    let app = ClientApp::start(&config, &NonInteractivePrompt).await?;

    let mut revisions = app.view().board().subscribe();
    let (stop_tx, mut stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        let _ = stop_tx.send(true);
    });

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                let revision = *revisions.borrow_and_update();
                let count = app.view().board().len().await;
                tracing::info!(revision = revision, orders = count, "Order list updated");
            }
        }
    }

    app.shutdown().await
}
