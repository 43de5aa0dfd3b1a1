//! Per-request context threaded through every authenticated operation.

use std::time::Duration;

use auth::Identity;
use common::Deadline;

use crate::error::{DomainError, Result};

/// Default budget for one inbound request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Proof of a passed identity gate plus the request's time budget.
///
/// A `Context` can only be built from a verified [`Identity`], which makes
/// the gate the single authorization checkpoint: no service operation that
/// takes a `Context` can run without it. The deadline is checked between
/// orchestration steps; once it passes, the operation fails with
/// [`DomainError::DeadlineExceeded`] before any local write opens.
#[derive(Debug, Clone)]
pub struct Context {
    identity: Identity,
    deadline: Deadline,
}

impl Context {
    /// Context with the default request budget.
    pub fn new(identity: Identity) -> Self {
        Self::with_deadline(identity, Deadline::after(REQUEST_TIMEOUT))
    }

    /// Context with an explicit deadline.
    pub fn with_deadline(identity: Identity, deadline: Deadline) -> Self {
        Self { identity, deadline }
    }

    /// The verified caller.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The request deadline.
    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Fails with `DeadlineExceeded` once the budget is spent.
    pub fn check_deadline(&self) -> Result<()> {
        self.deadline
            .check()
            .map_err(|_| DomainError::DeadlineExceeded)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn identity() -> Identity {
        let gate = auth::IdentityGate::new(b"ctx-test");
        let token = gate.issue("tester", auth::TOKEN_TTL).unwrap();
        gate.verify(Some(&format!("Bearer {token}"))).unwrap()
    }

    #[test]
    fn fresh_context_passes_deadline_check() {
        let ctx = Context::new(identity());
        assert!(ctx.check_deadline().is_ok());
        assert_eq!(ctx.identity().username(), "tester");
    }

    #[test]
    fn expired_context_fails_deadline_check() {
        let ctx = Context::with_deadline(identity(), Deadline::after(Duration::ZERO));
        assert!(matches!(
            ctx.check_deadline(),
            Err(DomainError::DeadlineExceeded)
        ));
    }
}
