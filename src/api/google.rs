//! Google Generative Language (Gemini) adapter

use super::client::Transport;
use super::{AdapterError, AdapterKind, AdapterSettings, AiRequest, Credential, ProviderAdapter, Role};
use async_trait::async_trait;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleAdapter {
    settings: AdapterSettings,
    transport: Transport,
}

impl GoogleAdapter {
    pub fn new(settings: AdapterSettings, transport: Transport) -> Self {
        Self {
            settings,
            transport,
        }
    }

    fn build_request(&self, request: &AiRequest, system_prompt: &str) -> Value {
        let mut contents = Vec::new();

        for msg in &request.history {
            // Gemini calls the assistant side "model"
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            contents.push(json!({
                "role": role,
                "parts": [{ "text": msg.content }]
            }));
        }

        contents.push(json!({
            "role": "user",
            "parts": [{ "text": request.prompt }]
        }));

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.settings.temperature_for(request),
                "maxOutputTokens": self.settings.max_tokens_for(request),
            }
        });

        if !system_prompt.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system_prompt }] });
        }

        body
    }

    fn parse_response(&self, response: &Value) -> Result<String, AdapterError> {
        if let Some(reason) = response["promptFeedback"]["blockReason"].as_str() {
            return Err(AdapterError::ClientStatus {
                status: 400,
                message: format!("prompt blocked: {}", reason),
            });
        }

        let parts = response["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| AdapterError::Malformed("missing candidates[0].content.parts".to_string()))?;

        Ok(parts.iter().filter_map(|part| part["text"].as_str()).collect())
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    async fn invoke(
        &self,
        request: &AiRequest,
        system_prompt: &str,
        credential: &Credential,
    ) -> Result<String, AdapterError> {
        if credential.is_blank() {
            return Err(AdapterError::Credential("Google AI API key is empty".to_string()));
        }

        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint(DEFAULT_BASE_URL),
            self.settings.model
        );
        let body = self.build_request(request, system_prompt);
        let headers = [("x-goog-api-key", credential.expose().to_string())];

        let json = self
            .transport
            .post_json(&url, &headers, &body, self.settings.timeout)
            .await?;
        self.parse_response(&json)
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Google
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HistoryMessage, TaskKind};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter_for(server: &MockServer) -> GoogleAdapter {
        let mut settings = AdapterSettings::new("gemini-pro");
        settings.base_url = Some(server.uri());
        GoogleAdapter::new(settings, Transport::new().unwrap())
    }

    #[test]
    fn test_history_roles_are_mapped() {
        let adapter = GoogleAdapter::new(AdapterSettings::new("gemini-pro"), Transport::new().unwrap());
        let request = AiRequest::new(TaskKind::VoiceAnalysis, "analyze").with_history(vec![
            HistoryMessage {
                role: Role::Assistant,
                content: "earlier answer".to_string(),
            },
        ]);

        let body = adapter.build_request(&request, "");
        assert_eq!(body["contents"][0]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "analyze");
        assert!(body.get("systemInstruction").is_none());
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4000);
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-pro:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "pitch is " }, { "text": "steady" }] }
                }]
            })))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = AiRequest::new(TaskKind::VoiceAnalysis, "analyze");
        let text = adapter
            .invoke(&request, "analyst", &Credential::new("g-key"))
            .await
            .unwrap();
        assert_eq!(text, "pitch is steady");
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server);
        let request = AiRequest::new(TaskKind::VoiceAnalysis, "analyze");
        let err = adapter
            .invoke(&request, "", &Credential::new("g-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::ClientStatus { status: 400, .. }));
    }
}
