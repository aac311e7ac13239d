//! Types shared by the health server components.

use std::fmt;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the probe listener binds to (`host:port`)
    pub listen_addr: String,

    /// Upper bound on graceful shutdown of the probe listener
    pub shutdown_timeout: Duration,

    /// Proxy connection limit (0 = unlimited)
    pub max_connections: u64,

    /// Whether `/metrics` is served alongside the probes
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8090".to_string(),
            shutdown_timeout: Duration::from_secs(5),
            max_connections: 0,
            metrics_enabled: true,
        }
    }
}

/// Kind of health probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    Liveness,
    Readiness,
}

impl Probe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Probe::Liveness => "liveness",
            Probe::Readiness => "readiness",
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_names() {
        assert_eq!(Probe::Liveness.to_string(), "liveness");
        assert_eq!(Probe::Readiness.to_string(), "readiness");
    }

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8090");
        assert_eq!(config.max_connections, 0);
        assert!(config.metrics_enabled);
    }
}
