//! Liveness and readiness tracking for the proxy process.

use crate::connections::ConnectionCounter;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Outcome of a readiness evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Startup is complete and the connection limit has headroom
    Ready,
    /// Startup has not completed yet
    Starting,
    /// The active connection count has reached the configured limit
    AtCapacity { active: u64, max: u64 },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Ready => write!(f, "ready"),
            Readiness::Starting => write!(f, "startup not complete"),
            Readiness::AtCapacity { active, max } => {
                write!(f, "at connection limit ({}/{})", active, max)
            }
        }
    }
}

/// Health tracker
///
/// Answers liveness and readiness queries for a proxy whose connections are
/// accounted in a shared [`ConnectionCounter`]. All state is owned by the
/// instance, so independent trackers never observe each other.
///
/// Every method takes `&self`; wrap the tracker in an [`Arc`] to share it
/// between the startup path, probe handlers and anything else.
pub struct HealthTracker {
    /// Set once startup has completed. Never cleared.
    started: AtomicBool,
    connections: Arc<ConnectionCounter>,
}

impl HealthTracker {
    /// Create a tracker bound to the proxy's connection counter.
    ///
    /// The tracker starts in the not-started state and does not open any
    /// listener.
    pub fn new(connections: Arc<ConnectionCounter>) -> Self {
        Self {
            started: AtomicBool::new(false),
            connections,
        }
    }

    /// Record that the proxy has finished starting up.
    ///
    /// Idempotent. Any query issued after this returns observes the
    /// started state.
    pub fn notify_started(&self) {
        if !self.started.swap(true, Ordering::AcqRel) {
            info!("Startup complete, readiness enabled");
        }
    }

    /// Whether startup has completed.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Whether the process is alive. Always true while the tracker exists.
    pub fn is_live(&self) -> bool {
        true
    }

    /// Whether the proxy should receive new connections.
    pub fn is_ready(&self) -> bool {
        self.readiness().is_ready()
    }

    /// Evaluate readiness and report why it failed, if it did.
    ///
    /// Recomputed on every call from the current startup flag and the live
    /// connection count.
    pub fn readiness(&self) -> Readiness {
        if !self.is_started() {
            return Readiness::Starting;
        }

        let max = self.connections.max();
        if max > 0 {
            let active = self.connections.active();
            if active >= max {
                return Readiness::AtCapacity { active, max };
            }
        }

        Readiness::Ready
    }

    /// The connection counter this tracker reads from.
    pub fn connections(&self) -> &Arc<ConnectionCounter> {
        &self.connections
    }
}

impl fmt::Debug for HealthTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthTracker")
            .field("started", &self.is_started())
            .field("connections", &self.connections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with_max(max: u64) -> (HealthTracker, Arc<ConnectionCounter>) {
        let counter = Arc::new(ConnectionCounter::new(max));
        (HealthTracker::new(counter.clone()), counter)
    }

    #[test]
    fn test_live_before_and_after_start() {
        let (tracker, _) = tracker_with_max(0);
        assert!(tracker.is_live());
        tracker.notify_started();
        assert!(tracker.is_live());
    }

    #[test]
    fn test_not_ready_before_start() {
        for max in [0, 1, 10] {
            let (tracker, _) = tracker_with_max(max);
            assert!(!tracker.is_ready());
            assert_eq!(tracker.readiness(), Readiness::Starting);
        }
    }

    #[test]
    fn test_not_ready_before_start_even_with_headroom() {
        let (tracker, counter) = tracker_with_max(10);
        let _guard = counter.acquire();
        assert!(!tracker.is_ready());
    }

    #[test]
    fn test_ready_after_start_unlimited() {
        let (tracker, counter) = tracker_with_max(0);
        tracker.notify_started();
        assert!(tracker.is_ready());

        let _guards: Vec<_> = (0..500).map(|_| counter.acquire()).collect();
        assert!(tracker.is_ready());
    }

    #[test]
    fn test_limit_boundaries() {
        let (tracker, counter) = tracker_with_max(10);
        tracker.notify_started();

        let mut guards: Vec<_> = (0..9).map(|_| counter.acquire()).collect();
        assert!(tracker.is_ready());

        guards.push(counter.acquire());
        assert!(!tracker.is_ready());
        assert_eq!(
            tracker.readiness(),
            Readiness::AtCapacity { active: 10, max: 10 }
        );

        guards.push(counter.acquire());
        assert!(!tracker.is_ready());
        assert_eq!(
            tracker.readiness(),
            Readiness::AtCapacity { active: 11, max: 10 }
        );
    }

    #[test]
    fn test_notify_started_is_idempotent() {
        let (tracker, _) = tracker_with_max(0);
        tracker.notify_started();
        tracker.notify_started();
        assert!(tracker.is_started());
        assert!(tracker.is_ready());
    }

    #[test]
    fn test_readiness_never_touches_counter() {
        let (tracker, counter) = tracker_with_max(1);
        tracker.notify_started();
        for _ in 0..10 {
            assert!(tracker.is_ready());
        }
        assert_eq!(counter.active(), 0);
    }

    #[test]
    fn test_readiness_display() {
        assert_eq!(Readiness::Ready.to_string(), "ready");
        assert_eq!(Readiness::Starting.to_string(), "startup not complete");
        assert_eq!(
            Readiness::AtCapacity { active: 3, max: 3 }.to_string(),
            "at connection limit (3/3)"
        );
    }

    #[test]
    fn test_independent_trackers() {
        let (first, _) = tracker_with_max(0);
        let (second, _) = tracker_with_max(0);
        first.notify_started();
        assert!(first.is_ready());
        assert!(!second.is_ready());
    }
}
