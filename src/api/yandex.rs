//! Yandex Foundation Models (YandexGPT) adapter

use super::client::Transport;
use super::{AdapterError, AdapterKind, AdapterSettings, AiRequest, Credential, ProviderAdapter};
use async_trait::async_trait;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://llm.api.cloud.yandex.net/foundationModels/v1";

pub struct YandexAdapter {
    settings: AdapterSettings,
    transport: Transport,
}

impl YandexAdapter {
    pub fn new(settings: AdapterSettings, transport: Transport) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// `gpt://<folder>/<model>`; a model already given as a URI is used as is
    fn model_uri(&self) -> Result<String, AdapterError> {
        if self.settings.model.starts_with("gpt://") {
            return Ok(self.settings.model.clone());
        }

        match self.settings.folder_id.as_deref() {
            Some(folder) if !folder.trim().is_empty() => {
                Ok(format!("gpt://{}/{}", folder.trim(), self.settings.model))
            }
            _ => Err(AdapterError::Credential(
                "Yandex folder id is not configured".to_string(),
            )),
        }
    }

    fn build_request(
        &self,
        request: &AiRequest,
        system_prompt: &str,
        model_uri: String,
    ) -> Value {
        let mut messages = Vec::new();

        if !system_prompt.is_empty() {
            messages.push(json!({ "role": "system", "text": system_prompt }));
        }

        for msg in &request.history {
            messages.push(json!({ "role": msg.role.as_str(), "text": msg.content }));
        }

        messages.push(json!({ "role": "user", "text": request.prompt }));

        json!({
            "modelUri": model_uri,
            "completionOptions": {
                "stream": false,
                "temperature": self.settings.temperature_for(request),
                // The API takes maxTokens as a string
                "maxTokens": self.settings.max_tokens_for(request).to_string(),
            },
            "messages": messages,
        })
    }

    fn parse_response(&self, response: &Value) -> Result<String, AdapterError> {
        response["result"]["alternatives"][0]["message"]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AdapterError::Malformed("missing result.alternatives[0].message.text".to_string())
            })
    }
}

#[async_trait]
impl ProviderAdapter for YandexAdapter {
    async fn invoke(
        &self,
        request: &AiRequest,
        system_prompt: &str,
        credential: &Credential,
    ) -> Result<String, AdapterError> {
        if credential.is_blank() {
            return Err(AdapterError::Credential("Yandex API key is empty".to_string()));
        }

        let model_uri = self.model_uri()?;
        let url = format!("{}/completion", self.settings.endpoint(DEFAULT_BASE_URL));
        let body = self.build_request(request, system_prompt, model_uri);

        let mut headers = vec![("Authorization", format!("Api-Key {}", credential.expose()))];
        if let Some(folder) = &self.settings.folder_id {
            headers.push(("x-folder-id", folder.clone()));
        }

        let json = self
            .transport
            .post_json(&url, &headers, &body, self.settings.timeout)
            .await?;
        self.parse_response(&json)
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::Yandex
    }
}
