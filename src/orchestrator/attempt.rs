//! Per-candidate bookkeeping: failure kinds, diagnostics, cancellation guard

use crate::api::AdapterError;
use crate::health::HealthTracker;
use crate::ratelimit::RejectReason;
use serde::Serialize;
use tracing::warn;

/// Why a candidate did not produce the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Credential,
    Transport,
    ClientStatus,
    ServerStatus,
    Timeout,
    Quota,
    Malformed,
    /// Validator rejected the completion
    Rejected,
    /// Local admission control said no; not an attempt
    RateLimited(RejectReason),
    /// Skipped by the circuit breaker; not an attempt
    CircuitOpen,
}

impl FailureKind {
    /// Whether this outcome was recorded against the provider's health
    pub fn counts_as_attempt(&self) -> bool {
        !matches!(self, FailureKind::RateLimited(_) | FailureKind::CircuitOpen)
    }
}

impl From<&AdapterError> for FailureKind {
    fn from(err: &AdapterError) -> Self {
        match err {
            AdapterError::Credential(_) => FailureKind::Credential,
            AdapterError::Transport(_) => FailureKind::Transport,
            AdapterError::ClientStatus { .. } => FailureKind::ClientStatus,
            AdapterError::ServerStatus { .. } => FailureKind::ServerStatus,
            AdapterError::Timeout => FailureKind::Timeout,
            AdapterError::Quota(_) => FailureKind::Quota,
            AdapterError::Malformed(_) => FailureKind::Malformed,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Credential => f.write_str("credential"),
            FailureKind::Transport => f.write_str("transport"),
            FailureKind::ClientStatus => f.write_str("provider 4xx"),
            FailureKind::ServerStatus => f.write_str("provider 5xx"),
            FailureKind::Timeout => f.write_str("timeout"),
            FailureKind::Quota => f.write_str("provider quota"),
            FailureKind::Malformed => f.write_str("malformed response"),
            FailureKind::Rejected => f.write_str("validator reject"),
            FailureKind::RateLimited(reason) => write!(f, "rate limited ({})", reason),
            FailureKind::CircuitOpen => f.write_str("circuit open"),
        }
    }
}

/// One line of the exhaustion report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptDiagnostic {
    pub provider: String,
    pub kind: FailureKind,
    pub message: String,
}

impl AttemptDiagnostic {
    pub fn new(provider: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn from_adapter(provider: &str, err: &AdapterError) -> Self {
        Self::new(provider, FailureKind::from(err), err.to_string())
    }
}

impl std::fmt::Display for AttemptDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.provider, self.kind, self.message)
    }
}

/// Debits the provider's health if dropped while armed.
///
/// Armed for the duration of one adapter call. When the enclosing `process`
/// future is dropped mid-call, the drop runs here and the attempt counts as
/// a failure.
pub(crate) struct AttemptGuard<'a> {
    health: &'a HealthTracker,
    provider: &'a str,
    armed: bool,
}

impl<'a> AttemptGuard<'a> {
    pub(crate) fn arm(health: &'a HealthTracker, provider: &'a str) -> Self {
        Self {
            health,
            provider,
            armed: true,
        }
    }

    /// The adapter call finished; the caller records the outcome itself
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(provider = self.provider, "adapter call cancelled");
            self.health.record_failure(self.provider);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_guard_records_failure() {
        let health = HealthTracker::default();
        {
            let _guard = AttemptGuard::arm(&health, "a");
        }
        assert_eq!(health.snapshot("a").failures, 1);
    }

    #[test]
    fn test_disarmed_guard_records_nothing() {
        let health = HealthTracker::default();
        AttemptGuard::arm(&health, "a").disarm();
        assert_eq!(health.snapshot("a").attempts, 0);
    }

    #[test]
    fn test_failure_kind_mapping() {
        let err = AdapterError::ServerStatus {
            status: 503,
            message: "busy".to_string(),
        };
        assert_eq!(FailureKind::from(&err), FailureKind::ServerStatus);
        assert!(FailureKind::Rejected.counts_as_attempt());
        assert!(!FailureKind::RateLimited(RejectReason::Rpm).counts_as_attempt());
        assert!(!FailureKind::CircuitOpen.counts_as_attempt());
    }
}
