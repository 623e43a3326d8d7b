//! Request orchestration with ordered fallback
//!
//! This module coordinates every other component for one request:
//! - Cache lookup by fingerprint (hits short-circuit everything else)
//! - Candidate ordering from the router
//! - Local admission control per candidate
//! - Adapter call under a wall-clock timeout, then validation
//! - Health, rate-limit and cache updates on the way out

mod attempt;
mod mentor;

#[cfg(test)]
pub(crate) mod scripted;

pub use attempt::{AttemptDiagnostic, FailureKind};
pub use mentor::{analyze_emotion, Emotion, MentorReply};

use crate::api::{
    build_adapter, cost_for, AdapterError, AiRequest, AiResponse, ProviderAdapter, Transport,
};
use crate::cache::{fingerprint, CacheSummary, ResponseCache};
use crate::config::{
    Config, ConfigError, CredentialStore, OrchestratorSettings, ProviderDescriptor,
};
use crate::health::{HealthSnapshot, HealthTracker};
use crate::persona::{PersonaTable, NEUTRAL_SYSTEM_PROMPT};
use crate::ratelimit::{RateLimiter, RateUsage};
use crate::router::{Route, Router};
use crate::validate::{Validator, Verdict};
use attempt::AttemptGuard;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced by [`Orchestrator::process`]
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("no configured provider has a valid credential")]
    NoProvider,

    #[error("all candidate providers failed ({} tried)", .attempts.len())]
    Exhausted { attempts: Vec<AttemptDiagnostic> },
}

/// Errors while assembling an orchestrator
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create HTTP transport: {0}")]
    Transport(#[from] AdapterError),
}

/// Operator-facing view of observed state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Every configured provider, zeros if never attempted
    pub providers: BTreeMap<String, HealthSnapshot>,
    pub cache_size: usize,
    pub configured_providers: usize,
    /// Credentialed providers, in configuration order
    pub available_providers: Vec<String>,
    pub rate_usage: BTreeMap<String, RateUsage>,
    pub cache: CacheSummary,
}

struct ProviderSlot {
    descriptor: ProviderDescriptor,
    adapter: Arc<dyn ProviderAdapter>,
}

/// Routes requests across providers with cache, admission control and fallback
pub struct Orchestrator {
    settings: OrchestratorSettings,
    /// Configuration order
    order: Vec<String>,
    slots: HashMap<String, ProviderSlot>,
    credentials: CredentialStore,
    router: Router,
    cache: ResponseCache,
    health: HealthTracker,
    limiter: RateLimiter,
    validator: Validator,
    personas: PersonaTable,
    /// Held so the connection pool lives exactly as long as the orchestrator
    _transport: Transport,
}

impl Orchestrator {
    /// Build with env-sourced credentials and the stock adapters
    pub fn from_config(config: Config) -> Result<Self, BuildError> {
        OrchestratorBuilder::new(config).build()
    }

    pub fn builder(config: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(config)
    }

    /// Serve one request from cache or the first provider that succeeds
    pub async fn process(&self, request: &AiRequest) -> Result<AiResponse, OrchestratorError> {
        let fingerprint = fingerprint(request, self.settings.default_temperature);
        debug!(task = %request.task_kind, fingerprint = %fingerprint, "processing request");

        if let Some(hit) = self.cache.lookup(&fingerprint) {
            info!(provider = %hit.provider_used, task = %request.task_kind, "cache hit");
            return Ok(hit);
        }

        if !self.router.has_providers() {
            warn!(task = %request.task_kind, "no credentialed provider");
            return Err(OrchestratorError::NoProvider);
        }

        let Route { circuit_open, .. } = self.router.route(request.task_kind, &self.health);

        // Walk the full static order so diagnostics line up with it
        let order = self.router.candidates(request.task_kind);
        let mut attempts = Vec::with_capacity(order.len());
        for candidate in &order {
            if circuit_open.iter().any(|skipped| skipped.name == candidate.name) {
                attempts.push(AttemptDiagnostic::new(
                    candidate.name.as_str(),
                    FailureKind::CircuitOpen,
                    "recent failure",
                ));
                continue;
            }
            match self.attempt(&candidate.name, request).await {
                Ok(response) => {
                    info!(
                        provider = %response.provider_used,
                        task = %request.task_kind,
                        latency_ms = response.latency_ms,
                        tokens = response.tokens_used,
                        "request served"
                    );
                    self.cache.store(fingerprint, response.clone());
                    return Ok(response);
                }
                Err(diagnostic) => attempts.push(diagnostic),
            }
        }

        warn!(task = %request.task_kind, tried = attempts.len(), "all providers exhausted");
        Err(OrchestratorError::Exhausted { attempts })
    }

    /// One candidate: admission, adapter call, validation, accounting
    async fn attempt(
        &self,
        provider: &str,
        request: &AiRequest,
    ) -> Result<AiResponse, AttemptDiagnostic> {
        let (Some(slot), Some(credential)) =
            (self.slots.get(provider), self.credentials.get(provider))
        else {
            return Err(AttemptDiagnostic::new(
                provider,
                FailureKind::Credential,
                "provider not configured",
            ));
        };

        let reservation = match self.limiter.reserve(provider) {
            Ok(reservation) => reservation,
            Err(reason) => {
                warn!(provider, %reason, "rate limit reject");
                return Err(AttemptDiagnostic::new(
                    provider,
                    FailureKind::RateLimited(reason),
                    format!("local {} ceiling reached", reason),
                ));
            }
        };

        let base = slot
            .descriptor
            .system_prompt_for(request.task_kind)
            .unwrap_or(NEUTRAL_SYSTEM_PROMPT);
        let system_prompt = self
            .personas
            .compose_system_prompt(base, request.mentor_id.as_deref());

        let guard = AttemptGuard::arm(&self.health, provider);
        let started = Instant::now();
        let result = tokio::time::timeout(
            slot.descriptor.timeout(&self.settings),
            slot.adapter.invoke(request, &system_prompt, credential),
        )
        .await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        guard.disarm();

        let text = match result.unwrap_or(Err(AdapterError::Timeout)) {
            Ok(text) => text,
            Err(err) => {
                warn!(provider, error = %err, latency_ms, "adapter failure");
                self.health.record_failure(provider);
                return Err(AttemptDiagnostic::from_adapter(provider, &err));
            }
        };

        let confidence = match self.validator.assess(&text, request.task_kind) {
            Verdict::Accept { confidence } => confidence,
            Verdict::Reject { reason } => {
                warn!(provider, %reason, "validator reject");
                self.health.record_failure(provider);
                return Err(AttemptDiagnostic::new(provider, FailureKind::Rejected, reason));
            }
        };

        self.health.record_success(provider, latency_ms);

        let input = [system_prompt.as_str(), request.prompt.as_str()].concat();
        let tokens_used = slot.adapter.estimate_tokens(&input) + slot.adapter.estimate_tokens(&text);
        reservation.charge(tokens_used as u64);

        let mut metadata = BTreeMap::new();
        metadata.insert("adapter".to_string(), slot.adapter.kind().to_string());
        metadata.insert("model".to_string(), slot.descriptor.model.clone());
        metadata.insert("task_kind".to_string(), request.task_kind.to_string());
        if let Some(mentor) = &request.mentor_id {
            metadata.insert("mentor_id".to_string(), mentor.clone());
        }

        Ok(AiResponse {
            content: text,
            provider_used: provider.to_string(),
            tokens_used,
            latency_ms,
            confidence,
            cost_estimate: cost_for(tokens_used, slot.descriptor.cost_per_1k_tokens),
            metadata,
        })
    }

    /// Pure read of health, cache and rate state
    pub fn report(&self) -> Report {
        let providers = self
            .order
            .iter()
            .map(|name| (name.clone(), self.health.snapshot(name)))
            .collect();
        let rate_usage = self
            .order
            .iter()
            .filter_map(|name| Some((name.clone(), self.limiter.usage(name)?)))
            .collect();

        Report {
            providers,
            cache_size: self.cache.len(),
            configured_providers: self.order.len(),
            available_providers: self
                .router
                .available()
                .into_iter()
                .map(String::from)
                .collect(),
            rate_usage,
            cache: self.cache.summary(),
        }
    }

    /// Candidate order for `task` as the next request would see it
    pub fn route(&self, task: crate::api::TaskKind) -> Route {
        self.router.route(task, &self.health)
    }

    /// Descriptors in configuration order
    pub fn providers(&self) -> impl Iterator<Item = &ProviderDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.slots.get(name).map(|slot| &slot.descriptor))
    }

    pub fn is_credentialed(&self, provider: &str) -> bool {
        self.credentials.has(provider)
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn personas(&self) -> &PersonaTable {
        &self.personas
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

/// Builder for injecting credentials or adapters (tests, embedding)
pub struct OrchestratorBuilder {
    config: Config,
    credentials: Option<CredentialStore>,
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl OrchestratorBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            credentials: None,
            adapters: HashMap::new(),
        }
    }

    /// Use this store instead of resolving credentials from the environment
    pub fn credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replace the stock adapter for `provider`
    pub fn adapter(mut self, provider: impl Into<String>, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(provider.into(), adapter);
        self
    }

    pub fn build(mut self) -> Result<Orchestrator, BuildError> {
        self.config.validate()?;

        let Config {
            orchestrator: settings,
            providers,
            personas,
        } = self.config;

        let credentials = self
            .credentials
            .unwrap_or_else(|| CredentialStore::from_env(&providers));
        let transport = Transport::new()?;

        let limiter = RateLimiter::new(
            settings.rate_window(),
            providers.iter().map(|d| (d.name.clone(), d.rate_limits())),
        );
        let router = Router::new(&providers, &credentials, settings.circuit_window());

        let order = providers.iter().map(|d| d.name.clone()).collect();
        let slots = providers
            .into_iter()
            .map(|descriptor| {
                let adapter = self.adapters.remove(&descriptor.name).unwrap_or_else(|| {
                    build_adapter(
                        descriptor.adapter,
                        descriptor.adapter_settings(&settings),
                        &transport,
                    )
                });
                (
                    descriptor.name.clone(),
                    ProviderSlot {
                        descriptor,
                        adapter,
                    },
                )
            })
            .collect();

        info!(
            available = ?router.available(),
            "orchestrator ready"
        );

        Ok(Orchestrator {
            health: HealthTracker::new(settings.ewma_alpha),
            cache: ResponseCache::with_capacity(settings.cache_capacity),
            validator: Validator::new(settings.min_response_chars),
            personas: PersonaTable::new(personas),
            settings,
            order,
            slots,
            credentials,
            router,
            limiter,
            _transport: transport,
        })
    }
}
