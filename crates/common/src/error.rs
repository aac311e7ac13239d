//! Common error types for proxy health components.

use std::fmt;
use std::time::Duration;

/// A specialized Result type for proxy health operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for proxy health operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("Unknown error: {0}")]
    Other(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl fmt::Display) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new other error.
    pub fn other(msg: impl fmt::Display) -> Self {
        Error::Other(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = Error::Bind {
            addr: "127.0.0.1:8090".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().starts_with("Failed to bind 127.0.0.1:8090"));
    }

    #[test]
    fn test_shutdown_timeout_display() {
        let err = Error::ShutdownTimeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Shutdown did not complete within 5s");
    }
}
