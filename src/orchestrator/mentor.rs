//! Mentor conversation replies on top of `process`

use super::{Orchestrator, OrchestratorError};
use crate::api::{AiRequest, HistoryMessage, TaskKind};
use serde::{Deserialize, Serialize};

/// History messages carried into the prompt
const HISTORY_WINDOW: usize = 5;

const MENTOR_TEMPERATURE: f32 = 0.8;
const MENTOR_MAX_TOKENS: u32 = 1500;

/// Avatar mood derived from the reply text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Excited,
    Thinking,
    Explaining,
    Questioning,
    Confident,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Excited => "excited",
            Emotion::Thinking => "thinking",
            Emotion::Explaining => "explaining",
            Emotion::Questioning => "questioning",
            Emotion::Confident => "confident",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentorReply {
    pub text: String,
    pub emotion: Emotion,
    pub provider_used: String,
    pub confidence: f64,
    pub latency_ms: u64,
    pub cost: f64,
}

const EXCITED_CUES: &[&str] = &[
    "отлично",
    "великолепно",
    "потрясающе",
    "excellent",
    "amazing",
    "fantastic",
];
const THINKING_CUES: &[&str] = &["думаю", "считаю", "анализ", "i think", "i believe", "analysis"];
const EXPLAINING_CUES: &[&str] = &[
    "рекомендую",
    "советую",
    "предлагаю",
    "i recommend",
    "i suggest",
    "i advise",
];

/// Keyword classifier; earlier classes win
pub fn analyze_emotion(text: &str) -> Emotion {
    let lower = text.to_lowercase();
    let has = |cues: &[&str]| cues.iter().any(|cue| lower.contains(cue));

    if has(EXCITED_CUES) {
        Emotion::Excited
    } else if has(THINKING_CUES) {
        Emotion::Thinking
    } else if has(EXPLAINING_CUES) {
        Emotion::Explaining
    } else if text.contains('?') {
        Emotion::Questioning
    } else {
        Emotion::Confident
    }
}

impl Orchestrator {
    /// Answer `message` in the voice of `mentor_id`
    pub async fn mentor_reply(
        &self,
        mentor_id: &str,
        message: &str,
        history: &[HistoryMessage],
    ) -> Result<MentorReply, OrchestratorError> {
        let prompt = self.conversation_prompt(mentor_id, message, history);
        let request = AiRequest::new(TaskKind::BusinessAdvice, prompt)
            .with_mentor(mentor_id)
            .with_temperature(MENTOR_TEMPERATURE)
            .with_max_tokens(MENTOR_MAX_TOKENS);

        let response = self.process(&request).await?;

        Ok(MentorReply {
            emotion: analyze_emotion(&response.content),
            text: response.content,
            provider_used: response.provider_used,
            confidence: response.confidence,
            latency_ms: response.latency_ms,
            cost: response.cost_estimate,
        })
    }

    fn conversation_prompt(&self, mentor_id: &str, message: &str, history: &[HistoryMessage]) -> String {
        let mut prompt = format!("User question: {}\n\n", message);

        if !history.is_empty() {
            prompt.push_str("Previous conversation:\n");
            let start = history.len().saturating_sub(HISTORY_WINDOW);
            for entry in &history[start..] {
                prompt.push_str(&format!("{}: {}\n", entry.role.as_str(), entry.content));
            }
            prompt.push('\n');
        }

        prompt.push_str(&format!(
            "Please provide a personalized response as {} that:\n\
             1. Addresses the user's specific situation\n\
             2. Provides actionable advice\n\
             3. Draws from relevant experience and expertise\n\
             4. Is encouraging and motivational\n\
             5. Includes specific next steps\n\
             6. Uses a conversational, mentor-like tone\n\n\
             Respond in {} language.",
            self.mentor_display_name(mentor_id),
            self.settings().mentor_language
        ));

        prompt
    }

    fn mentor_display_name(&self, mentor_id: &str) -> String {
        if self.personas().contains(mentor_id) {
            return self.personas().lookup(mentor_id).name.clone();
        }

        // "ada_lovelace" -> "Ada Lovelace"
        mentor_id
            .split('_')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AdapterKind, Role};
    use crate::config::{ConfigBuilder, CredentialStore, ProviderDescriptor};
    use crate::orchestrator::scripted::ScriptedAdapter;

    fn orchestrator(reply: &str) -> (Orchestrator, std::sync::Arc<ScriptedAdapter>) {
        let adapter = ScriptedAdapter::replying(reply);
        let config = ConfigBuilder::empty()
            .provider(
                ProviderDescriptor::new("gpt", AdapterKind::OpenAi, "m")
                    .with_capabilities([TaskKind::BusinessAdvice])
                    .with_cost(0.01),
            )
            .build();
        let orch = Orchestrator::builder(config)
            .credentials(CredentialStore::new().with("gpt", "k"))
            .adapter("gpt", adapter.clone())
            .build()
            .unwrap();
        (orch, adapter)
    }

    #[test]
    fn test_emotion_classes() {
        assert_eq!(analyze_emotion("Отлично! Давайте начнём."), Emotion::Excited);
        assert_eq!(analyze_emotion("I think the market is ready"), Emotion::Thinking);
        assert_eq!(analyze_emotion("Я рекомендую начать с MVP."), Emotion::Explaining);
        assert_eq!(analyze_emotion("What does your customer want?"), Emotion::Questioning);
        assert_eq!(analyze_emotion("Ship it today."), Emotion::Confident);
        // Earlier classes win
        assert_eq!(analyze_emotion("Excellent question?"), Emotion::Excited);
    }

    #[tokio::test]
    async fn test_mentor_reply_request_shape() {
        let (orch, adapter) = orchestrator("Я рекомендую начать с малого и думать о клиенте.");

        let history: Vec<HistoryMessage> = (0..7)
            .map(|i| HistoryMessage {
                role: if i % 2 == 0 { Role::User } else { Role::Assistant },
                content: format!("message {}", i),
            })
            .collect();

        let reply = orch
            .mentor_reply("warren_buffett", "How do I start?", &history)
            .await
            .unwrap();

        assert_eq!(reply.provider_used, "gpt");
        assert_eq!(reply.emotion, Emotion::Explaining);

        let request = adapter.last_request().unwrap();
        assert_eq!(request.task_kind, TaskKind::BusinessAdvice);
        assert_eq!(request.temperature, Some(0.8));
        assert_eq!(request.max_tokens, Some(1500));
        assert_eq!(request.mentor_id.as_deref(), Some("warren_buffett"));

        assert!(request.prompt.starts_with("User question: How do I start?\n\n"));
        assert!(request.prompt.contains("as Warren Buffett that:"));
        assert!(request.prompt.ends_with("Respond in Russian language."));
        // Only the last five history messages
        assert!(!request.prompt.contains("message 1\n"));
        assert!(request.prompt.contains("user: message 2\n"));
        assert!(request.prompt.contains("user: message 6\n"));

        let system = adapter.last_system_prompt().unwrap();
        assert!(system.contains("You are embodying Warren Buffett."));
    }

    #[tokio::test]
    async fn test_unknown_mentor_name_is_title_cased() {
        let (orch, adapter) = orchestrator("Keep building and measure every week.");

        orch.mentor_reply("ada_lovelace", "Any advice?", &[]).await.unwrap();

        let request = adapter.last_request().unwrap();
        assert!(request.prompt.contains("as Ada Lovelace that:"));
        assert!(!request.prompt.contains("Previous conversation"));
    }
}
