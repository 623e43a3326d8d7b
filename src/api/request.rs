//! Normalized AI request structures

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Intent declared by the caller; drives routing and validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    CodeGeneration,
    MobileDevelopment,
    Conversation,
    VoiceAnalysis,
    CreativeWriting,
    TechnicalAnalysis,
    BusinessAdvice,
}

impl TaskKind {
    pub const ALL: [TaskKind; 7] = [
        TaskKind::CodeGeneration,
        TaskKind::MobileDevelopment,
        TaskKind::Conversation,
        TaskKind::VoiceAnalysis,
        TaskKind::CreativeWriting,
        TaskKind::TechnicalAnalysis,
        TaskKind::BusinessAdvice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::CodeGeneration => "code_generation",
            TaskKind::MobileDevelopment => "mobile_development",
            TaskKind::Conversation => "conversation",
            TaskKind::VoiceAnalysis => "voice_analysis",
            TaskKind::CreativeWriting => "creative_writing",
            TaskKind::TechnicalAnalysis => "technical_analysis",
            TaskKind::BusinessAdvice => "business_advice",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        TaskKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                let known: Vec<_> = TaskKind::ALL.iter().map(TaskKind::as_str).collect();
                format!("unknown task kind '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// A message from earlier in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Request handed to the orchestrator by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    pub task_kind: TaskKind,

    /// User-visible prompt text
    pub prompt: String,

    /// Selects a persona preamble merged into the system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentor_id: Option<String>,

    /// Normalized temperature (0.0 - 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Advisory conversation excerpt; not part of the cache fingerprint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryMessage>,

    /// Opaque caller tag, only used for logging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_tag: Option<String>,
}

impl AiRequest {
    pub fn new(task_kind: TaskKind, prompt: impl Into<String>) -> Self {
        Self {
            task_kind,
            prompt: prompt.into(),
            mentor_id: None,
            temperature: None,
            max_tokens: None,
            history: Vec::new(),
            user_tag: None,
        }
    }

    pub fn with_mentor(mut self, mentor_id: impl Into<String>) -> Self {
        self.mentor_id = Some(mentor_id.into());
        self
    }

    /// NaN and infinite values are ignored and the provider default applies
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.is_finite().then_some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_history(mut self, history: Vec<HistoryMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_user_tag(mut self, tag: impl Into<String>) -> Self {
        self.user_tag = Some(tag.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind_parse() {
        assert_eq!("code_generation".parse::<TaskKind>(), Ok(TaskKind::CodeGeneration));
        assert_eq!("Mobile-Development".parse::<TaskKind>(), Ok(TaskKind::MobileDevelopment));
        assert!("poetry".parse::<TaskKind>().is_err());
    }

    #[test]
    fn test_task_kind_serde_matches_display() {
        for kind in TaskKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: AiRequest =
            serde_json::from_str(r#"{"task_kind":"conversation","prompt":"hello"}"#).unwrap();
        assert_eq!(request.task_kind, TaskKind::Conversation);
        assert!(request.mentor_id.is_none());
        assert!(request.history.is_empty());
    }
}
