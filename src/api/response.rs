//! Unified AI response returned to callers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response from the orchestrator, whichever provider produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    /// The generated content
    pub content: String,

    /// Name of the provider that produced the content
    pub provider_used: String,

    /// Estimated tokens consumed (adapter's own rule)
    pub tokens_used: usize,

    /// Wall-clock latency of the successful provider call
    pub latency_ms: u64,

    /// Validator confidence (0.0 - 1.0)
    pub confidence: f64,

    /// Estimated cost in USD
    pub cost_estimate: f64,

    /// Adapter name, task kind, persona id
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl AiResponse {
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Cost of `tokens` at a per-1k rate
pub fn cost_for(tokens: usize, cost_per_1k: f64) -> f64 {
    (tokens as f64 / 1000.0) * cost_per_1k
}
