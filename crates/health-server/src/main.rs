//! Proxy health server binary

use health_server::{Config, HealthServer, MetricsRegistry, TracingOptions, setup_tracing};
use proxy_health::{ConnectionCounter, HealthTracker};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first (needed for logging settings). A missing file
    // means defaults; a file that fails to parse or validate is fatal.
    let config = Config::load().map_err(common::Error::from)?;

    let options = TracingOptions {
        log_level: config.logging.level.clone().unwrap_or_else(|| "info".into()),
        json: config.logging.is_json(),
        otel_enabled: config.telemetry.enabled,
        service_name: config.telemetry.service_name.clone(),
        otlp_endpoint: config.telemetry.otlp_endpoint.clone(),
    };

    // Telemetry guard flushes spans on drop
    let _telemetry_guard = setup_tracing(&options).await?;

    tracing::info!("Proxy health server starting");

    let server_config = config.to_server_config();

    tracing::info!(
        listen_addr = %server_config.listen_addr,
        max_connections = server_config.max_connections,
        metrics_enabled = server_config.metrics_enabled,
        "Configuration loaded"
    );

    let connections = Arc::new(ConnectionCounter::new(server_config.max_connections));
    let tracker = Arc::new(HealthTracker::new(connections));
    let metrics = server_config
        .metrics_enabled
        .then(|| Arc::new(MetricsRegistry::new()));

    let server = HealthServer::bind(tracker.clone(), &server_config, metrics).await?;

    // Probes are served from here on; readiness flips once startup is done
    tracker.notify_started();

    shutdown_signal().await;

    server.close().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
