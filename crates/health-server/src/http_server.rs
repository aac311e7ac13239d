//! HTTP endpoints for liveness and readiness probes.

use crate::metrics::MetricsRegistry;
use crate::types::{Probe, ServerConfig};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use common::{Error, Result};
use proxy_health::HealthTracker;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub const LIVENESS_PATH: &str = "/liveness";
pub const READINESS_PATH: &str = "/readiness";
pub const METRICS_PATH: &str = "/metrics";

/// State shared by all probe handlers
#[derive(Clone)]
struct AppState {
    tracker: Arc<HealthTracker>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl AppState {
    fn record(&self, probe: Probe, passed: bool) {
        if let Some(ref m) = self.metrics {
            m.record_probe(probe, passed);
        }
    }
}

/// Build the probe router.
///
/// `/metrics` is only routed when a registry is supplied.
pub fn router(tracker: Arc<HealthTracker>, metrics: Option<Arc<MetricsRegistry>>) -> Router {
    let serve_metrics = metrics.is_some();
    let mut app = Router::new()
        .route(LIVENESS_PATH, get(liveness_handler))
        .route(READINESS_PATH, get(readiness_handler));

    if serve_metrics {
        app = app.route(METRICS_PATH, get(metrics_handler));
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(AppState { tracker, metrics })
}

/// Running probe listener
///
/// Serves on a background task from [`HealthServer::bind`] until
/// [`HealthServer::close`] is called.
pub struct HealthServer {
    /// Address actually bound (resolves port 0)
    local_addr: SocketAddr,
    /// Cancelled to begin graceful shutdown
    shutdown: CancellationToken,
    /// Serve task
    handle: JoinHandle<std::io::Result<()>>,
    /// Upper bound on graceful shutdown
    shutdown_timeout: Duration,
}

impl HealthServer {
    /// Bind the probe listener and start serving.
    ///
    /// Binding happens before this returns, so an unavailable address is
    /// reported to the caller rather than logged from the serve task.
    pub async fn bind(
        tracker: Arc<HealthTracker>,
        config: &ServerConfig,
        metrics: Option<Arc<MetricsRegistry>>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .map_err(|source| Error::Bind {
                addr: config.listen_addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let app = router(tracker, metrics);
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
        });

        info!(listen_addr = %local_addr, "Health server listening");

        Ok(Self {
            local_addr,
            shutdown,
            handle,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Gracefully shut down the listener.
    ///
    /// New probes are refused immediately; in-flight probes get up to the
    /// configured shutdown timeout to complete before the serve task is
    /// aborted and [`Error::ShutdownTimeout`] is returned.
    pub async fn close(mut self) -> Result<()> {
        info!(listen_addr = %self.local_addr, "Shutting down health server");
        self.shutdown.cancel();

        match tokio::time::timeout(self.shutdown_timeout, &mut self.handle).await {
            Ok(Ok(result)) => {
                result?;
                info!("Health server stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(Error::other(format!("health server task failed: {}", e))),
            Err(_) => {
                warn!(timeout = ?self.shutdown_timeout, "Health server shutdown timed out");
                self.handle.abort();
                Err(Error::ShutdownTimeout(self.shutdown_timeout))
            }
        }
    }
}

impl Drop for HealthServer {
    fn drop(&mut self) {
        // Stop the listener when the server is dropped without close()
        self.shutdown.cancel();
    }
}

/// Handler for /liveness
async fn liveness_handler(State(state): State<AppState>) -> Response {
    let live = state.tracker.is_live();
    state.record(Probe::Liveness, live);
    probe_response(live)
}

/// Handler for /readiness
async fn readiness_handler(State(state): State<AppState>) -> Response {
    let readiness = state.tracker.readiness();
    let ready = readiness.is_ready();
    if !ready {
        warn!(reason = %readiness, "Readiness probe failed");
    }
    state.record(Probe::Readiness, ready);
    probe_response(ready)
}

/// Handler for /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let Some(registry) = state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };

    registry.observe(&state.tracker);

    match registry.encode() {
        Ok(buffer) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            buffer,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

fn probe_response(passed: bool) -> Response {
    if passed {
        (StatusCode::OK, "ok").into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "error").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxy_health::ConnectionCounter;
    use std::io::Write;
    use std::sync::Mutex;

    /// Log sink shared with a test subscriber
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn state(max: u64, metrics: bool) -> AppState {
        AppState {
            tracker: Arc::new(HealthTracker::new(Arc::new(ConnectionCounter::new(max)))),
            metrics: metrics.then(|| Arc::new(MetricsRegistry::new())),
        }
    }

    #[tokio::test]
    async fn test_liveness_handler_ok() {
        let response = liveness_handler(State(state(0, false))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_handler_before_start() {
        let response = readiness_handler(State(state(0, false))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_readiness_failure_logged_at_warn() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let state = state(2, false);
        readiness_handler(State(state.clone())).await;

        state.tracker.notify_started();
        let _guards: Vec<_> = (0..2).map(|_| state.tracker.connections().acquire()).collect();
        readiness_handler(State(state)).await;

        let logs = captured.text();
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Readiness probe failed"));
        assert!(logs.contains("startup not complete"));
        assert!(logs.contains("at connection limit (2/2)"));
    }

    #[tokio::test]
    async fn test_readiness_handler_after_start() {
        let state = state(0, true);
        state.tracker.notify_started();
        let response = readiness_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_handler_without_registry() {
        let response = metrics_handler(State(state(0, false))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_handler_with_registry() {
        let response = metrics_handler(State(state(4, true))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn test_bind_reports_address_in_use() {
        let tracker = Arc::new(HealthTracker::new(Arc::new(ConnectionCounter::unlimited())));
        let config = ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        };

        let first = HealthServer::bind(tracker.clone(), &config, None).await.unwrap();
        let taken = ServerConfig {
            listen_addr: first.local_addr().to_string(),
            ..config
        };

        let err = HealthServer::bind(tracker, &taken, None).await.err().unwrap();
        assert!(matches!(err, Error::Bind { .. }));

        first.close().await.unwrap();
    }
}
