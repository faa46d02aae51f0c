//! Cache Entry Module
//!
//! Defines the deadline-carrying value stored by the TTL cache.

use std::time::Duration;

use tokio::time::Instant;

/// Deadline offset used when now + ttl does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

// == Expiring ==
/// A value paired with the instant after which it is considered stale.
///
/// Built once at insertion time and never mutated; re-adding a key stores a
/// fresh `Expiring` with a new deadline.
#[derive(Debug, Clone)]
pub struct Expiring<V> {
    value: V,
    deadline: Instant,
}

impl<V> Expiring<V> {
    // == Constructor ==
    /// Wraps `value` with a deadline of now + `ttl`, capped at roughly
    /// thirty years for TTLs the clock cannot represent.
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { value, deadline }
    }

    // == Is Expired ==
    /// Checks if the deadline has been reached.
    ///
    /// Boundary condition: an entry is expired when the current time is greater
    /// than or equal to the deadline, so a TTL of `d` keeps the value readable
    /// for times strictly below `insert + d`.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Strips the deadline.
    pub fn into_value(self) -> V {
        self.value
    }
}
