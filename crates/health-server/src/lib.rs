//! Proxy Health Server
//!
//! Exposes the liveness and readiness of a network proxy over HTTP so that
//! an orchestrator (e.g. Kubernetes probes) can decide whether to restart
//! the process or route new connections to it.
//!
//! # Endpoints
//!
//! - `GET /liveness`: 200 `ok` while the process is running
//! - `GET /readiness`: 200 `ok` once startup has completed and the proxy is
//!   below its connection limit, 500 `error` otherwise
//! - `GET /metrics`: Prometheus metrics (when enabled)
//!
//! The probe answers come from [`proxy_health::HealthTracker`]; this crate
//! only owns the transport, configuration and process wiring.

pub mod config;
pub mod http_server;
pub mod metrics;
pub mod telemetry;
pub mod types;

pub use config::{Config, ConfigError};
pub use http_server::{HealthServer, LIVENESS_PATH, METRICS_PATH, READINESS_PATH};
pub use metrics::MetricsRegistry;
pub use telemetry::{TelemetryGuard, TracingOptions, setup_tracing};
pub use types::{Probe, ServerConfig};
