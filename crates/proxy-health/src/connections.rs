//! Active-connection accounting shared between the proxy and the health tracker.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live connection count paired with the configured connection limit.
///
/// The proxy's connection lifecycle owns the count and mutates it through
/// [`ConnectionGuard`]s. Everything else, including the health tracker, only
/// reads it. A `max` of zero means "no limit".
pub struct ConnectionCounter {
    active: AtomicU64,
    max: u64,
}

impl ConnectionCounter {
    /// Create a counter with the given limit (0 = unlimited).
    pub fn new(max: u64) -> Self {
        Self {
            active: AtomicU64::new(0),
            max,
        }
    }

    /// Create a counter with no connection limit.
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Current number of active connections.
    pub fn active(&self) -> u64 {
        self.active.load(Ordering::Acquire)
    }

    /// Configured connection limit (0 = unlimited).
    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn is_unlimited(&self) -> bool {
        self.max == 0
    }

    /// Whether the active count has reached the limit.
    ///
    /// A count equal to the limit is at capacity. Never true when unlimited.
    pub fn at_capacity(&self) -> bool {
        !self.is_unlimited() && self.active() >= self.max
    }

    /// Account for a new connection regardless of the limit.
    ///
    /// The returned guard releases the connection when dropped.
    pub fn acquire(self: &Arc<Self>) -> ConnectionGuard {
        self.active.fetch_add(1, Ordering::AcqRel);
        ConnectionGuard {
            counter: Arc::clone(self),
        }
    }

    /// Account for a new connection only if the limit allows it.
    ///
    /// Returns `None` and leaves the count untouched when accepting the
    /// connection would exceed a non-zero limit.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        let active = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        if !self.is_unlimited() && active > self.max {
            self.release();
            return None;
        }
        Some(ConnectionGuard {
            counter: Arc::clone(self),
        })
    }

    fn release(&self) {
        // Saturate at zero; a stray release must not wrap the count.
        let _ = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

impl Default for ConnectionCounter {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl fmt::Debug for ConnectionCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCounter")
            .field("active", &self.active())
            .field("max", &self.max)
            .finish()
    }
}

/// One accounted connection. Dropping it decrements the active count.
#[must_use = "dropping the guard immediately releases the connection"]
pub struct ConnectionGuard {
    counter: Arc<ConnectionCounter>,
}

impl fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionGuard").finish_non_exhaustive()
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter.release();
    }
}
