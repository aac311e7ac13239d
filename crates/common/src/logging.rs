//! Logging utilities for proxy health components.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize stdout logging with a default level and output format.
///
/// Uses the RUST_LOG environment variable to control log levels when set;
/// `level` applies otherwise. `json` selects JSON lines over plain text.
pub fn init(level: &str, json: bool) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with((!json).then(|| fmt::layer()))
        .with(json.then(|| fmt::layer().json()))
        .try_init()
}

/// Build the filter shared by every subscriber setup.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let _ = init("info", false);
        assert!(init("info", true).is_err());
    }
}
