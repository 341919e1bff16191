use std::sync::Arc;

use anyhow::Context;
use serverroom_pipeline::{Monitor, SqliteStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

use config::MonitorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Config first so LOG_FORMAT can pick the layer.
    let config = MonitorConfig::from_env();
    let json_logs = config.as_ref().is_ok_and(|c| c.json_logs);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "serverroom_monitor=info,serverroom_pipeline=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = config.context("Invalid configuration")?;
    tracing::info!(
        database_url = %config.database_url,
        shutdown_policy = %config.pipeline.shutdown_policy,
        failure_policy = %config.pipeline.persist_failure_policy,
        "Loaded configuration"
    );

    // --- Database ---
    let pool = serverroom_db::create_pool(&config.database_url)
        .await
        .context("Failed to open database")?;
    serverroom_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    serverroom_db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database ready");

    if config.seed_default_sensors {
        let seeded = serverroom_db::seed::seed_default_sensors(&pool)
            .await
            .context("Failed to seed default sensors")?;
        if seeded > 0 {
            serverroom_db::seed::seed_history(&pool, config.seed_history_days)
                .await
                .context("Failed to seed historical data")?;
        }
    }

    // --- Pipeline ---
    let mut monitor = Monitor::new(Arc::new(SqliteStore::new(pool.clone())), config.pipeline);
    monitor.start().await.context("Failed to start monitor")?;

    shutdown_signal().await;

    if let Some(report) = monitor.stop().await {
        match serde_json::to_string(&report) {
            Ok(json) => tracing::info!(report = %json, "Shutdown report"),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize shutdown report"),
        }
    }

    pool.close().await;
    tracing::info!("Monitor exited");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
