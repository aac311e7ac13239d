//! Prometheus metrics for the health server.

use crate::types::Probe;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use proxy_health::HealthTracker;

/// Labels for probe result metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ProbeLabels {
    /// Probe kind (liveness, readiness)
    pub probe: String,
    /// Result (success, failure)
    pub result: String,
}

/// Metrics registry with all health server metrics
pub struct MetricsRegistry {
    /// Prometheus registry
    pub registry: Registry,

    /// Probes answered, by kind and result
    probes_total: Family<ProbeLabels, Counter>,
    /// Result of the last readiness evaluation (1=ready, 0=not ready)
    ready: Gauge,
    /// Startup state (1=started, 0=starting)
    started: Gauge,
    /// Active proxy connections at last scrape
    active_connections: Gauge,
    /// Configured proxy connection limit (0=unlimited)
    max_connections: Gauge,
}

impl MetricsRegistry {
    /// Create a new metrics registry
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let probes_total = Family::<ProbeLabels, Counter>::default();
        registry.register(
            "proxy_health_probes",
            "Health probes answered",
            probes_total.clone(),
        );

        let ready = Gauge::default();
        registry.register(
            "proxy_health_ready",
            "Result of the last readiness evaluation (1=ready, 0=not ready)",
            ready.clone(),
        );

        let started = Gauge::default();
        registry.register(
            "proxy_health_started",
            "Whether proxy startup has completed (1=started, 0=starting)",
            started.clone(),
        );

        let active_connections = Gauge::default();
        registry.register(
            "proxy_health_active_connections",
            "Active proxy connections",
            active_connections.clone(),
        );

        let max_connections = Gauge::default();
        registry.register(
            "proxy_health_max_connections",
            "Configured proxy connection limit (0=unlimited)",
            max_connections.clone(),
        );

        Self {
            registry,
            probes_total,
            ready,
            started,
            active_connections,
            max_connections,
        }
    }

    /// Record the outcome of a probe
    pub fn record_probe(&self, probe: Probe, passed: bool) {
        self.probes_total
            .get_or_create(&ProbeLabels {
                probe: probe.as_str().to_string(),
                result: if passed { "success" } else { "failure" }.to_string(),
            })
            .inc();

        if probe == Probe::Readiness {
            self.ready.set(passed as i64);
        }
    }

    /// Refresh gauges that mirror tracker state
    pub fn observe(&self, tracker: &HealthTracker) {
        let connections = tracker.connections();
        self.started.set(tracker.is_started() as i64);
        self.active_connections
            .set(i64::try_from(connections.active()).unwrap_or(i64::MAX));
        self.max_connections
            .set(i64::try_from(connections.max()).unwrap_or(i64::MAX));
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
