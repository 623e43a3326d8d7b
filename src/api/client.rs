//! Shared egress transport and credential handling

use super::AdapterError;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Secret presented to a provider; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// The single HTTP client every adapter shares.
///
/// Created once by the orchestrator and released when it is dropped.
/// Cloning only clones the handle to the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Transport {
    client: Client,
}

impl Transport {
    pub fn new() -> Result<Self, AdapterError> {
        let client = Client::builder()
            .user_agent(concat!("ai-orchestrator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdapterError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// POST a JSON body and return the decoded JSON reply.
    ///
    /// Non-success statuses are classified into the adapter error taxonomy.
    pub(crate) async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &Value,
        timeout: Duration,
    ) -> Result<Value, AdapterError> {
        let mut builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .timeout(timeout);

        for (name, value) in headers {
            builder = builder.header(*name, value);
        }

        let response = builder.json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            let json: Value = response.json().await?;
            Ok(json)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(classify_status(status, error_text))
        }
    }
}

/// Map a non-success HTTP status to an adapter error
pub(crate) fn classify_status(status: StatusCode, body: String) -> AdapterError {
    let code = status.as_u16();
    match code {
        401 | 403 => AdapterError::Credential(format!("{}: {}", status, body)),
        402 | 429 => AdapterError::Quota(format!("{}: {}", status, body)),
        400..=499 => {
            let lower = body.to_lowercase();
            // Some providers report billing exhaustion as a plain 400
            if lower.contains("insufficient_quota") || lower.contains("quota exceeded") {
                AdapterError::Quota(format!("{}: {}", status, body))
            } else {
                AdapterError::ClientStatus {
                    status: code,
                    message: body,
                }
            }
        }
        _ => AdapterError::ServerStatus {
            status: code,
            message: body,
        },
    }
}
