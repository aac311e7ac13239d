//! Liveness and readiness reporting for a long-running network proxy.
//!
//! This crate answers two questions under concurrent access:
//! - Is the process alive?
//! - Is the process ready to accept new connections?
//!
//! Readiness requires that startup has completed and that the active
//! connection count is below the configured limit (a limit of zero means
//! unlimited). The connection count is owned by the proxy's connection
//! lifecycle; the tracker only reads it.
//!
//! # Example
//!
//! ```
//! use proxy_health::{ConnectionCounter, HealthTracker};
//! use std::sync::Arc;
//!
//! let connections = Arc::new(ConnectionCounter::new(2));
//! let tracker = HealthTracker::new(connections.clone());
//! assert!(!tracker.is_ready());
//!
//! tracker.notify_started();
//! assert!(tracker.is_ready());
//!
//! let _a = connections.acquire();
//! let _b = connections.acquire();
//! assert!(!tracker.is_ready());
//! ```

pub mod connections;
pub mod tracker;

pub use connections::{ConnectionCounter, ConnectionGuard};
pub use tracker::{HealthTracker, Readiness};
