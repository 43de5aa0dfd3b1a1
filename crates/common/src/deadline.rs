//! Per-request deadline tracking.

use std::time::{Duration, Instant};

/// Marker error returned when a deadline has already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineExpired;

impl std::fmt::Display for DeadlineExpired {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request deadline exceeded")
    }
}

impl std::error::Error for DeadlineExpired {}

/// The point in time by which an inbound request must finish.
///
/// Carried through every orchestration step so that long-running peer checks
/// or store calls can abort before the local write opens. A `Deadline` is
/// cheap to copy and checked between steps, not enforced preemptively.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    /// A deadline that never expires, for callers without a budget.
    pub fn none() -> Self {
        // ~30 years; effectively unbounded without risking Instant overflow.
        Self::after(Duration::from_secs(60 * 60 * 24 * 365 * 30))
    }

    /// Time left before expiry, zero once passed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// True once the deadline has passed.
    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Errors if the deadline has passed.
    pub fn check(&self) -> Result<(), DeadlineExpired> {
        if self.expired() {
            Err(DeadlineExpired)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_deadline_is_not_expired() {
        let d = Deadline::after(Duration::from_secs(5));
        assert!(!d.expired());
        assert!(d.check().is_ok());
        assert!(d.remaining() > Duration::ZERO);
    }

    #[test]
    fn zero_deadline_expires_immediately() {
        let d = Deadline::after(Duration::ZERO);
        assert!(d.expired());
        assert_eq!(d.check(), Err(DeadlineExpired));
        assert_eq!(d.remaining(), Duration::ZERO);
    }

    #[test]
    fn unbounded_deadline_stays_open() {
        assert!(!Deadline::none().expired());
    }
}
