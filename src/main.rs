//! Tileforge worker: consumes generation jobs and publishes tile pyramids.
//!
//! Main entry point that wires the crates together and runs the worker loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use tileforge_core::config::AppConfig;
use tileforge_core::error::AppError;
use tileforge_core::traits::queue::JobQueue;
use tileforge_worker::{HttpNotifier, JobOrchestrator, RedisJobQueue, WorkerRunner};

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
        tracing::error!(kind = %e.kind, error = %e.message, "Worker error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/default.toml`, `TILEFORGE_CONFIG` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path = std::env::var("TILEFORGE_CONFIG").ok();
    AppConfig::load(config_path.as_deref())
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
                .with_target(true)
                .init();
        }
    }
}

/// Main worker run function
async fn run(mut config: AppConfig) -> Result<(), AppError> {
    let hostname = std::env::var("HOSTNAME").ok();
    if config.worker.derive_id_from_host(hostname.as_deref()) {
        tracing::info!(worker_id = %config.worker.id, "Derived worker id from hostname");
    } else if config.worker.uses_default_id() {
        tracing::warn!(
            worker_id = %config.worker.id,
            "Using the default worker id; replicas must set TILEFORGE__WORKER__ID to distinct values"
        );
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        worker_id = %config.worker.id,
        "Starting Tileforge worker"
    );

    let queue = RedisJobQueue::connect(&config.queue, &config.worker.id).await?;
    let recovered = queue.recover().await?;
    if recovered > 0 {
        tracing::warn!(recovered, "Recovered jobs left in flight by a previous run");
    }

    let notifier = Arc::new(HttpNotifier::new(&config.callback)?);
    let orchestrator = Arc::new(JobOrchestrator::from_config(&config, notifier));

    if config.worker.sweep_on_start {
        let publisher = orchestrator.publisher().clone();
        let max_age = Duration::from_secs(config.storage.stale_after_seconds);
        match tokio::task::spawn_blocking(move || publisher.sweep(max_age)).await? {
            Ok(removed) => tracing::info!(removed, "Startup sweep finished"),
            Err(e) => tracing::warn!(error = %e, "Startup sweep failed"),
        }
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = WorkerRunner::new(Arc::new(queue), orchestrator, config.worker.clone());
    let worker = tokio::spawn(async move { runner.run(shutdown_rx).await });

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, finishing current job");
    let _ = shutdown_tx.send(true);

    worker.await?;
    tracing::info!("Tileforge worker shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
