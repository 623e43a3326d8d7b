//! Provider set shipped with a fresh install

use super::ProviderDescriptor;
use crate::api::{AdapterKind, TaskKind};

const MOBILE_PROMPT: &str = "You are an expert iOS/Android developer.\n\
Create production-ready mobile apps with:\n\
1. Native Swift/Kotlin code\n\
2. Modern UI frameworks (SwiftUI/Jetpack Compose)\n\
3. Complete project structure\n\
4. Error handling and testing\n\
5. Performance optimization";

const CODE_PROMPT: &str = "You are a senior software architect.\n\
Generate clean, maintainable, and well-documented code with:\n\
1. Industry best practices\n\
2. Proper error handling\n\
3. Unit tests\n\
4. Performance considerations\n\
5. Security best practices";

const BUSINESS_PROMPT: &str = "You are a business mentor with expertise from successful entrepreneurs.\n\
Provide actionable advice that is:\n\
1. Practical and implementable\n\
2. Based on real-world experience\n\
3. Tailored to the user's situation\n\
4. Focused on results and growth\n\
5. Clear and easy to understand";

const CONVERSATION_PROMPT: &str = "You are an empathetic and knowledgeable mentor.\n\
Respond in a way that is:\n\
1. Warm and encouraging\n\
2. Informative and helpful\n\
3. Tailored to the individual\n\
4. Action-oriented\n\
5. Inspiring and motivational";

/// Four tiers: premium, fast, specialized, regional fallback
pub fn default_providers() -> Vec<ProviderDescriptor> {
    vec![
        ProviderDescriptor::new("claude", AdapterKind::Anthropic, "claude-3-5-sonnet-20241022")
            .with_label("Claude 3.5 Sonnet")
            .with_credential_env("ANTHROPIC_API_KEY")
            .with_capabilities([
                TaskKind::CodeGeneration,
                TaskKind::TechnicalAnalysis,
                TaskKind::MobileDevelopment,
            ])
            .with_priority(1)
            .with_reliability(0.95)
            .with_limits(50, 1_000_000)
            .with_cost(0.015)
            .with_max_tokens(8192)
            .with_system_prompt(TaskKind::MobileDevelopment, MOBILE_PROMPT)
            .with_system_prompt(TaskKind::CodeGeneration, CODE_PROMPT),
        ProviderDescriptor::new("gpt4", AdapterKind::OpenAi, "gpt-4-1106-preview")
            .with_label("GPT-4 Turbo")
            .with_credential_env("OPENAI_API_KEY")
            .with_capabilities([
                TaskKind::Conversation,
                TaskKind::CreativeWriting,
                TaskKind::BusinessAdvice,
            ])
            .with_priority(2)
            .with_reliability(0.92)
            .with_limits(500, 2_000_000)
            .with_cost(0.01)
            .with_max_tokens(4096)
            .with_system_prompt(TaskKind::BusinessAdvice, BUSINESS_PROMPT)
            .with_system_prompt(TaskKind::Conversation, CONVERSATION_PROMPT),
        ProviderDescriptor::new("gemini", AdapterKind::Google, "gemini-pro")
            .with_label("Gemini Pro")
            .with_credential_env("GOOGLE_AI_API_KEY")
            .with_capabilities([TaskKind::VoiceAnalysis, TaskKind::TechnicalAnalysis])
            .with_priority(3)
            .with_reliability(0.88)
            .with_limits(60, 1_000_000)
            .with_cost(0.0005)
            .with_max_tokens(2048),
        ProviderDescriptor::new("yandexgpt", AdapterKind::Yandex, "yandexgpt/latest")
            .with_label("YandexGPT")
            .with_credential_env("YANDEX_API_KEY")
            .with_capabilities([TaskKind::Conversation])
            .with_priority(4)
            .with_reliability(0.75)
            .with_limits(20, 500_000)
            .with_cost(0.002)
            .with_max_tokens(2000),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers_are_distinct() {
        let providers = default_providers();
        let tiers: Vec<_> = providers.iter().map(|p| p.priority).collect();
        assert_eq!(tiers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_default_credential_vars() {
        let vars: Vec<_> = default_providers()
            .into_iter()
            .map(|p| p.credential_env)
            .collect();
        assert_eq!(
            vars,
            vec![
                "ANTHROPIC_API_KEY",
                "OPENAI_API_KEY",
                "GOOGLE_AI_API_KEY",
                "YANDEX_API_KEY"
            ]
        );
    }
}
