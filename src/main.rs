use push_notifier::api::router;
use push_notifier::formatter::PushEventFormatter;
use push_notifier::logging::{FileLogger, setup_logging};
use push_notifier::notifier::ChatWebhookNotifier;
use push_notifier::{AppState, DEFAULT_CONFIG_PATH, load_config};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config_path = PathBuf::from(
        std::env::var("PUSH_NOTIFIER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
    );

    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let file_logger = config
        .logging
        .directory
        .clone()
        .map(|dir| FileLogger::new(dir).with_max_files(config.logging.max_files));
    // Keep the guard alive so file logs are flushed on exit
    let _log_guard = match setup_logging(file_logger.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Logging setup error: {}", e);
            std::process::exit(1);
        }
    };

    if !config.github.has_valid_secret() {
        warn!("GITHUB_WEBHOOK_SECRET is not set; every webhook will be rejected with 401");
    }

    let notifier = match ChatWebhookNotifier::new(&config.notifier) {
        Ok(n) => n,
        Err(e) => {
            error!("Could not create notifier: {}", e);
            std::process::exit(1);
        }
    };

    let bind_address = config.server.bind_address.clone();
    let state = Arc::new(AppState::new(
        config,
        PushEventFormatter::new(),
        Arc::new(notifier),
    ));
    let app = router(state);

    info!("Using config at {:?}", config_path);
    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };
    info!("Listening on {}", bind_address);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
    info!("Shutdown complete");
}

/// Resolves when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
