//! Candidate ordering per task kind
//!
//! Ordering is static and deterministic: specialized providers first, then
//! general ones, each sorted by `(priority, -reliability)` from the
//! descriptors. Live health only matters when the circuit breaker is on, and
//! then it removes providers rather than reordering them.

use crate::api::TaskKind;
use crate::config::{CredentialStore, ProviderDescriptor};
use crate::health::HealthTracker;
use std::cmp::Ordering;
use std::time::Duration;
use tracing::debug;

/// One routed provider
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub specialized: bool,
}

/// Why a credentialed provider was left out of the candidate list
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub name: String,
}

/// Candidate list plus the providers the circuit breaker held back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    pub candidates: Vec<Candidate>,
    pub circuit_open: Vec<Skipped>,
}

impl Route {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.name.as_str()).collect()
    }
}

pub struct Router {
    /// Credentialed providers only, in configuration order
    providers: Vec<ProviderDescriptor>,
    circuit_window: Option<Duration>,
}

impl Router {
    /// Drops every descriptor that has no credential in `credentials`
    pub fn new(
        descriptors: &[ProviderDescriptor],
        credentials: &CredentialStore,
        circuit_window: Option<Duration>,
    ) -> Self {
        let providers = descriptors
            .iter()
            .filter(|d| {
                let has = credentials.has(&d.name);
                if !has {
                    debug!(provider = %d.name, "no credential, excluded from routing");
                }
                has
            })
            .cloned()
            .collect();

        Self {
            providers,
            circuit_window,
        }
    }

    /// Names of credentialed providers
    pub fn available(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Static ordering for `task`, ignoring live health
    pub fn candidates(&self, task: TaskKind) -> Vec<Candidate> {
        let (mut specialized, mut general): (Vec<_>, Vec<_>) = self
            .providers
            .iter()
            .partition(|p| p.is_specialized_for(task));

        specialized.sort_by(|a, b| rank(a, b));
        general.sort_by(|a, b| rank(a, b));

        specialized
            .into_iter()
            .map(|p| Candidate {
                name: p.name.clone(),
                specialized: true,
            })
            .chain(general.into_iter().map(|p| Candidate {
                name: p.name.clone(),
                specialized: false,
            }))
            .collect()
    }

    /// Static ordering with circuit-open providers removed
    pub fn route(&self, task: TaskKind, health: &HealthTracker) -> Route {
        let mut route = Route::default();

        for candidate in self.candidates(task) {
            let open = self
                .circuit_window
                .is_some_and(|window| health.is_circuit_open(&candidate.name, window));

            if open {
                debug!(provider = %candidate.name, "circuit open, skipping");
                route.circuit_open.push(Skipped {
                    name: candidate.name,
                });
            } else {
                route.candidates.push(candidate);
            }
        }

        debug!(task = %task, candidates = ?route.names(), "routed");
        route
    }
}

/// Ascending by priority tier, then descending by baseline reliability
fn rank(a: &ProviderDescriptor, b: &ProviderDescriptor) -> Ordering {
    a.priority.cmp(&b.priority).then_with(|| {
        b.reliability
            .partial_cmp(&a.reliability)
            .unwrap_or(Ordering::Equal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AdapterKind;

    fn descriptor(name: &str, tier: u32, reliability: f64, caps: &[TaskKind]) -> ProviderDescriptor {
        ProviderDescriptor::new(name, AdapterKind::OpenAi, "m")
            .with_priority(tier)
            .with_reliability(reliability)
            .with_capabilities(caps.iter().copied())
    }

    fn all_credentialed(descriptors: &[ProviderDescriptor]) -> CredentialStore {
        descriptors
            .iter()
            .fold(CredentialStore::new(), |store, d| store.with(&d.name, "key"))
    }

    #[test]
    fn test_specialized_before_general() {
        let descriptors = vec![
            descriptor("general-1", 1, 0.99, &[]),
            descriptor("special-3", 3, 0.5, &[TaskKind::CodeGeneration]),
            descriptor("special-2", 2, 0.5, &[TaskKind::CodeGeneration]),
        ];
        let router = Router::new(&descriptors, &all_credentialed(&descriptors), None);

        let names: Vec<_> = router
            .candidates(TaskKind::CodeGeneration)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["special-2", "special-3", "general-1"]);
    }

    #[test]
    fn test_reliability_breaks_tier_ties() {
        let descriptors = vec![
            descriptor("low", 1, 0.7, &[]),
            descriptor("high", 1, 0.9, &[]),
        ];
        let router = Router::new(&descriptors, &all_credentialed(&descriptors), None);

        let candidates = router.candidates(TaskKind::Conversation);
        assert_eq!(candidates[0].name, "high");
        assert_eq!(candidates[1].name, "low");
        assert!(!candidates[0].specialized);
    }

    #[test]
    fn test_uncredentialed_never_routed() {
        let descriptors = vec![
            descriptor("a", 1, 0.9, &[TaskKind::Conversation]),
            descriptor("b", 2, 0.9, &[]),
        ];
        let credentials = CredentialStore::new().with("b", "key");
        let router = Router::new(&descriptors, &credentials, None);

        for task in TaskKind::ALL {
            let names: Vec<_> = router.candidates(task).into_iter().map(|c| c.name).collect();
            assert_eq!(names, vec!["b"]);
        }
        assert_eq!(router.available(), vec!["b"]);
    }

    #[test]
    fn test_no_credentials_means_no_route() {
        let descriptors = vec![descriptor("a", 1, 0.9, &[])];
        let router = Router::new(&descriptors, &CredentialStore::new(), None);
        assert!(!router.has_providers());
        assert!(router.route(TaskKind::Conversation, &HealthTracker::default()).is_empty());
    }

    #[test]
    fn test_circuit_open_provider_is_dropped() {
        let descriptors = vec![
            descriptor("a", 1, 0.9, &[TaskKind::Conversation]),
            descriptor("b", 2, 0.9, &[]),
        ];
        let credentials = all_credentialed(&descriptors);
        let health = HealthTracker::default();
        health.record_failure("a");

        let breaker = Router::new(&descriptors, &credentials, Some(Duration::from_secs(30)));
        let route = breaker.route(TaskKind::Conversation, &health);
        assert_eq!(route.names(), vec!["b"]);
        assert_eq!(route.circuit_open, vec![Skipped { name: "a".to_string() }]);

        let plain = Router::new(&descriptors, &credentials, None);
        assert_eq!(plain.route(TaskKind::Conversation, &health).names(), vec!["a", "b"]);
    }
}
