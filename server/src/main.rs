//! `TigerTix` HTTP server.
//!
//! This binary:
//! - Opens `PostgreSQL` or `SQLite` storage and runs migrations
//! - Installs the Prometheus recorder and serves `/metrics`
//! - Serves the API until Ctrl+C or SIGTERM, then drains in-flight requests
//!
//! # Usage
//!
//! ```bash
//! DATABASE_URL=sqlite:tigertix.db cargo run -p tigertix-server
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use tigertix_runtime::metrics::MetricsServer;
use tigertix_server::{Config, Storage, app_state, redact};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tigertix=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        database = %redact(&config.database.url),
        address = %config.server.addr(),
        metrics = %config.server.metrics_addr(),
        "Configuration loaded"
    );

    let storage = Storage::open(&config).await?;
    let app = tigertix_web::build_router(app_state(&config, &storage));

    let metrics_addr: SocketAddr = config.server.metrics_addr().parse()?;
    let mut metrics = MetricsServer::new(metrics_addr);
    metrics.start()?;
    let metrics = Arc::new(metrics);
    let metrics_app = axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || {
            let metrics = Arc::clone(&metrics);
            async move { metrics.render().unwrap_or_default() }
        }),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = tokio::net::TcpListener::bind(config.server.addr()).await?;
    info!(address = %config.server.addr(), "HTTP server listening");
    let server_handle = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown_rx.clone()))
            .into_future(),
    );

    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr).await?;
    info!(address = %metrics_addr, "Prometheus metrics available at /metrics");
    let metrics_handle = tokio::spawn(
        axum::serve(metrics_listener, metrics_app)
            .with_graceful_shutdown(wait_for(shutdown_rx))
            .into_future(),
    );

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);

    let timeout = config.server.shutdown_timeout();
    let drained = tokio::time::timeout(timeout, async {
        for (name, handle) in [("HTTP", server_handle), ("metrics", metrics_handle)] {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(server = name, error = %err, "Server error"),
                Err(err) => warn!(server = name, error = %err, "Server task failed during shutdown"),
            }
        }
    })
    .await;

    if drained.is_err() {
        warn!(timeout_secs = timeout.as_secs(), "Shutdown timed out with requests in flight");
    }

    storage.close().await;
    info!("Server stopped");
    Ok(())
}

async fn wait_for(mut shutdown: watch::Receiver<bool>) {
    // An error means the sender is gone, which also means shut down.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
