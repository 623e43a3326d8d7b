//! Anthropic Messages API adapter

use super::client::Transport;
use super::{AdapterError, AdapterKind, AdapterSettings, AiRequest, Credential, ProviderAdapter};
use async_trait::async_trait;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicAdapter {
    settings: AdapterSettings,
    transport: Transport,
}

impl AnthropicAdapter {
    pub fn new(settings: AdapterSettings, transport: Transport) -> Self {
        Self {
            settings,
            transport,
        }
    }

    fn build_request(&self, request: &AiRequest, system_prompt: &str) -> Value {
        let mut messages = Vec::new();

        // Conversation history goes before the current prompt
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

        let mut body = json!({
            "model": self.settings.model,
            "messages": messages,
            "max_tokens": self.settings.max_tokens_for(request),
            "temperature": self.settings.temperature_for(request),
        });

        if !system_prompt.is_empty() {
            body["system"] = json!(system_prompt);
        }

        body
    }

    fn parse_response(&self, response: &Value) -> Result<String, AdapterError> {
        let blocks = response["content"]
            .as_array()
            .ok_or_else(|| AdapterError::Malformed("missing content blocks".to_string()))?;

        let text: String = blocks
            .iter()
            .filter(|block| block["type"].as_str().unwrap_or("text") == "text")
            .filter_map(|block| block["text"].as_str())
            .collect();

        Ok(text)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    async fn invoke(
        &self,
        request: &AiRequest,
        system_prompt: &str,
        credential: &Credential,
    ) -> Result<String, AdapterError> {
        if credential.is_blank() {
            return Err(AdapterError::Credential("Anthropic API key is empty".to_string()));
        }

        let url = format!("{}/messages", self.settings.endpoint(DEFAULT_BASE_URL));
        let body = self.build_request(request, system_prompt);
        let headers = [
            ("x-api-key", credential.expose().to_string()),
            ("anthropic-version", API_VERSION.to_string()),
        ];

        let json = self
            .transport
            .post_json(&url, &headers, &body, self.settings.timeout)
            .await?;
        self.parse_response(&json)
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Anthropic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HistoryMessage, Role, TaskKind};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter_for(server: &MockServer) -> AnthropicAdapter {
        let mut settings = AdapterSettings::new("claude-test");
        settings.base_url = Some(server.uri());
        settings.max_tokens_cap = 1000;
        AnthropicAdapter::new(settings, Transport::new().unwrap())
    }

    #[test]
    fn test_request_envelope() {
        let adapter = AnthropicAdapter::new(AdapterSettings::new("claude-test"), Transport::new().unwrap());
        let request = AiRequest::new(TaskKind::CodeGeneration, "write code")
            .with_temperature(0.2)
            .with_history(vec![HistoryMessage {
                role: Role::Assistant,
                content: "earlier".to_string(),
            }]);

        let body = adapter.build_request(&request, "be terse");
        assert_eq!(body["system"], "be terse");
        assert_eq!(body["messages"][0]["role"], "assistant");
        assert_eq!(body["messages"][1]["content"], "write code");
        assert_eq!(body["max_tokens"], 4000);
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "key-1"))
            .and(header("anthropic-version", API_VERSION))
            .and(body_partial_json(json!({ "model": "claude-test", "max_tokens": 1000 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    { "type": "text", "text": "Hello " },
                    { "type": "text", "text": "world" }
                ],
                "stop_reason": "end_turn"
            })))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = AiRequest::new(TaskKind::Conversation, "hi");
        let text = adapter
            .invoke(&request, "system", &Credential::new("key-1"))
            .await
            .unwrap();
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn test_invoke_maps_overloaded_to_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = AiRequest::new(TaskKind::Conversation, "hi");
        let err = adapter
            .invoke(&request, "", &Credential::new("key-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::ServerStatus { status: 529, .. }));
    }

    #[tokio::test]
    async fn test_blank_credential_is_rejected_locally() {
        let adapter = AnthropicAdapter::new(AdapterSettings::new("claude-test"), Transport::new().unwrap());
        let request = AiRequest::new(TaskKind::Conversation, "hi");
        let err = adapter.invoke(&request, "", &Credential::new("")).await.unwrap_err();
        assert!(matches!(err, AdapterError::Credential(_)));
    }
}
