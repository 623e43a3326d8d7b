//! ai_orchestrator - Route AI requests across multiple LLM providers
//!
//! Each request is matched to providers specialized for its task kind,
//! then tried in priority order until one returns an answer that passes
//! validation.
//!
//! ## Key Features
//!
//! - **Provider Adapters**: Anthropic, OpenAI, Google and YandexGPT behind one trait
//! - **Rate Limiting**: Per-provider requests-per-minute and tokens-per-day budgets
//! - **Response Cache**: Identical requests are answered without a provider call
//! - **Health Tracking**: Success rates and smoothed latency per provider
//! - **Mentor Personas**: Business mentor conversations with an emotion tag

pub mod api;
pub mod cache;
pub mod config;
pub mod health;
pub mod orchestrator;
pub mod persona;
pub mod ratelimit;
pub mod router;
pub mod tui;
pub mod validate;

pub use api::{AdapterError, AdapterKind, AiRequest, AiResponse, ProviderAdapter, TaskKind};
pub use cache::{CacheSummary, ResponseCache};
pub use config::{Config, ConfigBuilder, ConfigError, CredentialStore, ProviderDescriptor};
pub use health::{HealthSnapshot, HealthTracker};
pub use orchestrator::{
    AttemptDiagnostic, FailureKind, MentorReply, Orchestrator, OrchestratorBuilder,
    OrchestratorError, Report,
};
pub use persona::{Persona, PersonaTable};
pub use ratelimit::{RateLimiter, RateUsage};
pub use router::{Route, Router};
pub use validate::{Validator, Verdict};
