//! OpenAI Chat Completions adapter

use super::client::Transport;
use super::{AdapterError, AdapterKind, AdapterSettings, AiRequest, Credential, ProviderAdapter};
use async_trait::async_trait;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiAdapter {
    settings: AdapterSettings,
    transport: Transport,
}

impl OpenAiAdapter {
    pub fn new(settings: AdapterSettings, transport: Transport) -> Self {
        Self {
            settings,
            transport,
        }
    }

    fn build_request(&self, request: &AiRequest, system_prompt: &str) -> Value {
        let mut messages = Vec::new();

        if !system_prompt.is_empty() {
            messages.push(json!({
                "role": "system",
                "content": system_prompt
            }));
        }

        for msg in &request.history {
            messages.push(json!({
                "role": msg.role.as_str(),
                "content": msg.content
            }));
        }

        messages.push(json!({
            "role": "user",
            "content": request.prompt
        }));

        json!({
            "model": self.settings.model,
            "messages": messages,
            "max_tokens": self.settings.max_tokens_for(request),
            "temperature": self.settings.temperature_for(request),
        })
    }

    fn parse_response(&self, response: &Value) -> Result<String, AdapterError> {
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AdapterError::Malformed("missing choices[0].message.content".to_string()))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    async fn invoke(
        &self,
        request: &AiRequest,
        system_prompt: &str,
        credential: &Credential,
    ) -> Result<String, AdapterError> {
        if credential.is_blank() {
            return Err(AdapterError::Credential("OpenAI API key is empty".to_string()));
        }

        let url = format!("{}/chat/completions", self.settings.endpoint(DEFAULT_BASE_URL));
        let body = self.build_request(request, system_prompt);
        let headers = [("Authorization", format!("Bearer {}", credential.expose()))];

        let json = self
            .transport
            .post_json(&url, &headers, &body, self.settings.timeout)
            .await?;
        self.parse_response(&json)
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::OpenAi
    }
}
