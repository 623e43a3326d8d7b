//! Provider adapters and the normalized request/response types
//!
//! Each adapter speaks exactly one provider family's wire protocol. Adapters
//! never retry, never consult the cache and never touch health metrics; the
//! orchestrator owns all of that.

mod anthropic;
mod client;
mod google;
mod openai;
mod request;
mod response;
mod yandex;

pub use anthropic::AnthropicAdapter;
pub use client::{Credential, Transport};
pub use google::GoogleAdapter;
pub use openai::OpenAiAdapter;
pub use request::{AiRequest, HistoryMessage, Role, TaskKind};
pub use response::{cost_for, AiResponse};
pub use yandex::YandexAdapter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Max tokens requested when the caller does not give a cap
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Temperature used when the caller does not give one
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Credential missing or rejected: {0}")]
    Credential(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Provider rejected request ({status}): {message}")]
    ClientStatus { status: u16, message: String },

    #[error("Provider failed ({status}): {message}")]
    ServerStatus { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Provider quota exhausted: {0}")]
    Quota(String),

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_decode() {
            AdapterError::Malformed(err.to_string())
        } else {
            AdapterError::Transport(err.to_string())
        }
    }
}

/// Provider family an adapter speaks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Anthropic,
    OpenAi,
    Google,
    Yandex,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Anthropic => "anthropic",
            AdapterKind::OpenAi => "openai",
            AdapterKind::Google => "google",
            AdapterKind::Yandex => "yandex",
        }
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Per-provider call parameters fixed at construction
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    /// Model identifier (Yandex: model path or full `gpt://` URI)
    pub model: String,
    /// Endpoint override; each adapter has its own default
    pub base_url: Option<String>,
    /// Hard ceiling for max tokens on one request
    pub max_tokens_cap: u32,
    pub default_max_tokens: u32,
    pub default_temperature: f32,
    /// Per-call wall-clock limit
    pub timeout: Duration,
    /// Yandex Cloud folder used to build the model URI
    pub folder_id: Option<String>,
}

impl AdapterSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: None,
            max_tokens_cap: DEFAULT_MAX_TOKENS,
            default_max_tokens: DEFAULT_MAX_TOKENS,
            default_temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(30),
            folder_id: None,
        }
    }

    /// Caller's cap (or the default), bounded by the descriptor ceiling
    pub fn max_tokens_for(&self, request: &AiRequest) -> u32 {
        request
            .max_tokens
            .unwrap_or(self.default_max_tokens)
            .min(self.max_tokens_cap)
            .max(1)
    }

    /// Normalized temperature in 0.0..=1.0
    pub fn temperature_for(&self, request: &AiRequest) -> f32 {
        request
            .temperature
            .filter(|t| t.is_finite())
            .unwrap_or(self.default_temperature)
            .clamp(0.0, 1.0)
    }

    pub(crate) fn endpoint<'a>(&'a self, default: &'a str) -> &'a str {
        self.base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
    }
}

/// Byte-length token estimate: ceil(len / 4)
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Trait for provider adapters
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Send one completion request and return the provider's text verbatim
    async fn invoke(
        &self,
        request: &AiRequest,
        system_prompt: &str,
        credential: &Credential,
    ) -> Result<String, AdapterError>;

    fn estimate_tokens(&self, text: &str) -> usize {
        estimate_tokens(text)
    }

    fn kind(&self) -> AdapterKind;
}

/// Build the adapter for `kind`, sharing the orchestrator's transport
pub fn build_adapter(
    kind: AdapterKind,
    settings: AdapterSettings,
    transport: &Transport,
) -> Arc<dyn ProviderAdapter> {
    match kind {
        AdapterKind::Anthropic => Arc::new(AnthropicAdapter::new(settings, transport.clone())),
        AdapterKind::OpenAi => Arc::new(OpenAiAdapter::new(settings, transport.clone())),
        AdapterKind::Google => Arc::new(GoogleAdapter::new(settings, transport.clone())),
        AdapterKind::Yandex => Arc::new(YandexAdapter::new(settings, transport.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_max_tokens_capped_by_descriptor() {
        let mut settings = AdapterSettings::new("m");
        settings.max_tokens_cap = 1000;

        let uncapped = AiRequest::new(TaskKind::Conversation, "hi");
        assert_eq!(settings.max_tokens_for(&uncapped), 1000);

        let small = AiRequest::new(TaskKind::Conversation, "hi").with_max_tokens(200);
        assert_eq!(settings.max_tokens_for(&small), 200);
    }

    #[test]
    fn test_temperature_is_clamped() {
        let settings = AdapterSettings::new("m");
        let hot = AiRequest::new(TaskKind::Conversation, "hi").with_temperature(1.7);
        assert_eq!(settings.temperature_for(&hot), 1.0);

        let default = AiRequest::new(TaskKind::Conversation, "hi");
        assert_eq!(settings.temperature_for(&default), DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_adapter_kind_serde_names() {
        let kind: AdapterKind = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(kind, AdapterKind::OpenAi);
        assert_eq!(AdapterKind::Yandex.to_string(), "yandex");
    }
}
