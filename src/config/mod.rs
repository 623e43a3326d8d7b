//! Configuration management for the orchestrator
//!
//! Supports configuration via:
//! 1. Config file (~/.config/ai-orchestrator/config.toml, or AI_ORCHESTRATOR_CONFIG)
//! 2. Environment variables (ANTHROPIC_API_KEY, OPENAI_API_KEY, etc.)
//! 3. CLI arguments (override file/env settings)

mod credentials;
mod defaults;

pub use credentials::CredentialStore;
pub use defaults::default_providers;

use crate::api::{AdapterKind, AdapterSettings, TaskKind};
use crate::persona::{default_personas, Persona};
use crate::ratelimit::RateLimits;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Environment variable pointing at an alternative config file
pub const CONFIG_PATH_ENV: &str = "AI_ORCHESTRATOR_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Process-wide orchestration settings
    pub orchestrator: OrchestratorSettings,

    /// One descriptor per provider, in no particular order
    pub providers: Vec<ProviderDescriptor>,

    /// Mentor id -> persona
    pub personas: BTreeMap<String, Persona>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorSettings::default(),
            providers: default_providers(),
            personas: default_personas(),
        }
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Length of the sliding request window in seconds
    pub rate_window_secs: u64,

    /// Adapter call timeout unless a provider overrides it
    pub timeout_secs: u64,

    /// EWMA weight of the newest latency sample, in (0, 1]
    pub ewma_alpha: f64,

    /// Maximum cached responses (0 = unbounded)
    pub cache_capacity: usize,

    /// Skip providers whose last failure is younger than this (0 = disabled)
    pub circuit_open_secs: u64,

    /// Shortest accepted response after trimming
    pub min_response_chars: usize,

    /// Max tokens when the request gives none
    pub default_max_tokens: u32,

    /// Temperature when the request gives none
    pub default_temperature: f32,

    /// Language mentor replies are written in
    pub mentor_language: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            rate_window_secs: 60,
            timeout_secs: 30,
            ewma_alpha: crate::health::DEFAULT_EWMA_ALPHA,
            cache_capacity: 0,
            circuit_open_secs: 0,
            min_response_chars: crate::validate::DEFAULT_MIN_CHARS,
            default_max_tokens: crate::api::DEFAULT_MAX_TOKENS,
            default_temperature: crate::api::DEFAULT_TEMPERATURE,
            mentor_language: "Russian".to_string(),
        }
    }
}

impl OrchestratorSettings {
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// None when the circuit breaker is disabled
    pub fn circuit_window(&self) -> Option<Duration> {
        (self.circuit_open_secs > 0).then(|| Duration::from_secs(self.circuit_open_secs))
    }
}

/// Static description of one provider, read-only after startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Stable name used in logs, reports and rate/health records
    pub name: String,

    /// Human label
    pub label: String,

    /// Which adapter speaks to this provider
    pub adapter: AdapterKind,

    /// Provider-side model id
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Environment variable holding the API key
    pub credential_env: String,

    /// Inline API key (takes precedence over `credential_env`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Task kinds this provider is considered strong at
    #[serde(default)]
    pub capabilities: Vec<TaskKind>,

    pub max_tokens: u32,
    pub requests_per_minute: u32,
    pub tokens_per_day: u64,
    pub cost_per_1k_tokens: f64,

    /// Lower is preferred
    pub priority: u32,

    /// Static reliability in [0, 1], used only for ordering
    pub reliability: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Yandex cloud folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,

    /// Task kind name -> system prompt override
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub system_prompts: BTreeMap<String, String>,
}

impl ProviderDescriptor {
    /// Descriptor with permissive limits, mostly for tests and programmatic setup
    pub fn new(name: impl Into<String>, adapter: AdapterKind, model: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            credential_env: format!("{}_API_KEY", name.to_uppercase().replace(['-', ' '], "_")),
            name,
            adapter,
            model: model.into(),
            base_url: None,
            api_key: None,
            capabilities: Vec::new(),
            max_tokens: 4096,
            requests_per_minute: 60,
            tokens_per_day: 1_000_000,
            cost_per_1k_tokens: 0.0,
            priority: 1,
            reliability: 0.9,
            timeout_secs: None,
            folder_id: None,
            system_prompts: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = TaskKind>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability;
        self
    }

    pub fn with_limits(mut self, requests_per_minute: u32, tokens_per_day: u64) -> Self {
        self.requests_per_minute = requests_per_minute;
        self.tokens_per_day = tokens_per_day;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_cost(mut self, cost_per_1k_tokens: f64) -> Self {
        self.cost_per_1k_tokens = cost_per_1k_tokens;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_credential_env(mut self, var: impl Into<String>) -> Self {
        self.credential_env = var.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_system_prompt(mut self, task: TaskKind, prompt: impl Into<String>) -> Self {
        self.system_prompts
            .insert(task.as_str().to_string(), prompt.into());
        self
    }

    pub fn is_specialized_for(&self, task: TaskKind) -> bool {
        self.capabilities.contains(&task)
    }

    pub fn system_prompt_for(&self, task: TaskKind) -> Option<&str> {
        self.system_prompts.get(task.as_str()).map(String::as_str)
    }

    pub fn rate_limits(&self) -> RateLimits {
        RateLimits {
            requests_per_window: self.requests_per_minute,
            tokens_per_day: self.tokens_per_day,
        }
    }

    pub fn timeout(&self, settings: &OrchestratorSettings) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| settings.timeout())
    }

    /// Adapter-facing view of this descriptor
    pub fn adapter_settings(&self, settings: &OrchestratorSettings) -> AdapterSettings {
        AdapterSettings {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            max_tokens_cap: self.max_tokens,
            default_max_tokens: settings.default_max_tokens,
            default_temperature: settings.default_temperature,
            timeout: self.timeout(settings),
            folder_id: self.folder_id.clone(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |what: &str| Err(ConfigError::Invalid(format!("provider '{}': {}", self.name, what)));

        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingRequired("provider name".to_string()));
        }
        if self.model.trim().is_empty() {
            return invalid("model must not be empty");
        }
        if !(0.0..=1.0).contains(&self.reliability) {
            return invalid("reliability must be within [0, 1]");
        }
        if self.max_tokens == 0 || self.requests_per_minute == 0 || self.tokens_per_day == 0 {
            return invalid("max_tokens, requests_per_minute and tokens_per_day must be positive");
        }
        if !(self.cost_per_1k_tokens >= 0.0) {
            return invalid("cost_per_1k_tokens must not be negative");
        }
        if self.timeout_secs == Some(0) {
            return invalid("timeout_secs must be positive");
        }
        for task in self.system_prompts.keys() {
            if TaskKind::from_str(task).is_err() {
                return invalid(&format!("unknown task kind '{}' in system_prompts", task));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Get default config file path
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ai-orchestrator")
            .join("config.toml")
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path())
    }

    /// Load config from specific path; a missing file yields defaults
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        Ok(Self::load_raw(path)?.with_env_overrides())
    }

    /// File contents only, without environment overrides. Use this when the
    /// config will be written back, so env values are not persisted.
    pub fn load_raw(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply environment variable overrides.
    ///
    /// API keys are not copied into the config; they are resolved by
    /// [`CredentialStore::from_env`].
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    pub(crate) fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(folder) = lookup("YANDEX_FOLDER_ID") {
            if !folder.trim().is_empty() {
                for provider in self
                    .providers
                    .iter_mut()
                    .filter(|p| p.adapter == AdapterKind::Yandex && p.folder_id.is_none())
                {
                    provider.folder_id = Some(folder.clone());
                }
            }
        }

        self
    }

    /// Store an inline API key for `provider` in the file at `path`
    pub fn set_api_key(path: PathBuf, provider: &str, key: &str) -> Result<(), ConfigError> {
        let mut config = Self::load_raw(path.clone())?;
        let known: Vec<String> = config.providers.iter().map(|p| p.name.clone()).collect();
        let descriptor = config
            .providers
            .iter_mut()
            .find(|p| p.name == provider)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "unknown provider '{}' (configured: {})",
                    provider,
                    known.join(", ")
                ))
            })?;

        descriptor.api_key = Some(key.to_string());
        config.save_to(path)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path())
    }

    /// Save config to specific path
    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::MissingRequired(
                "at least one [[providers]] entry".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            provider.validate()?;
            if !seen.insert(provider.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate provider name '{}'",
                    provider.name
                )));
            }
        }

        let settings = &self.orchestrator;
        if !(settings.ewma_alpha > 0.0 && settings.ewma_alpha <= 1.0) {
            return Err(ConfigError::Invalid(
                "ewma_alpha must be within (0, 1]".to_string(),
            ));
        }
        if settings.rate_window_secs == 0 || settings.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate_window_secs and timeout_secs must be positive".to_string(),
            ));
        }
        if settings.default_max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "default_max_tokens must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&settings.default_temperature) {
            return Err(ConfigError::Invalid(
                "default_temperature must be within [0, 1]".to_string(),
            ));
        }

        Ok(())
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Generate example config content
    pub fn example() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}

/// Builder for creating Config programmatically
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start without any providers
    pub fn empty() -> Self {
        Self::new().clear_providers()
    }

    pub fn clear_providers(mut self) -> Self {
        self.config.providers.clear();
        self
    }

    pub fn provider(mut self, descriptor: ProviderDescriptor) -> Self {
        self.config.providers.push(descriptor);
        self
    }

    pub fn persona(mut self, mentor_id: impl Into<String>, persona: Persona) -> Self {
        self.config.personas.insert(mentor_id.into(), persona);
        self
    }

    pub fn rate_window_secs(mut self, secs: u64) -> Self {
        self.config.orchestrator.rate_window_secs = secs;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.orchestrator.timeout_secs = secs;
        self
    }

    pub fn ewma_alpha(mut self, alpha: f64) -> Self {
        self.config.orchestrator.ewma_alpha = alpha;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.orchestrator.cache_capacity = capacity;
        self
    }

    pub fn circuit_open_secs(mut self, secs: u64) -> Self {
        self.config.orchestrator.circuit_open_secs = secs;
        self
    }

    pub fn min_response_chars(mut self, chars: usize) -> Self {
        self.config.orchestrator.min_response_chars = chars;
        self
    }

    pub fn mentor_language(mut self, language: impl Into<String>) -> Self {
        self.config.orchestrator.mentor_language = language.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
