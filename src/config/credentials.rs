//! Process-wide credential store

use super::ProviderDescriptor;
use crate::api::Credential;
use std::collections::HashMap;

/// Provider name -> API key, built once at startup and read-only afterwards.
///
/// Blank keys are treated as absent, so a provider with `FOO_API_KEY=""`
/// is not credentialed.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    secrets: HashMap<String, Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve each descriptor's inline key, falling back to its env var
    pub fn from_env(providers: &[ProviderDescriptor]) -> Self {
        Self::resolve(providers, |var| std::env::var(var).ok())
    }

    pub(crate) fn resolve<F>(providers: &[ProviderDescriptor], lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut store = Self::new();
        for provider in providers {
            let secret = provider
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .or_else(|| lookup(&provider.credential_env));

            if let Some(secret) = secret {
                store = store.with(&provider.name, secret);
            }
        }
        store
    }

    pub fn with(mut self, provider: impl Into<String>, secret: impl Into<String>) -> Self {
        let credential = Credential::new(secret);
        if !credential.is_blank() {
            self.secrets.insert(provider.into(), credential);
        }
        self
    }

    pub fn get(&self, provider: &str) -> Option<&Credential> {
        self.secrets.get(provider)
    }

    pub fn has(&self, provider: &str) -> bool {
        self.secrets.contains_key(provider)
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AdapterKind;

    #[test]
    fn test_inline_key_wins_over_env() {
        let providers = vec![
            ProviderDescriptor::new("a", AdapterKind::OpenAi, "m").with_api_key("inline"),
            ProviderDescriptor::new("b", AdapterKind::OpenAi, "m").with_credential_env("B_KEY"),
            ProviderDescriptor::new("c", AdapterKind::OpenAi, "m").with_credential_env("C_KEY"),
        ];

        let store = CredentialStore::resolve(&providers, |var| match var {
            "A_API_KEY" => Some("from-env".to_string()),
            "B_KEY" => Some("b-secret".to_string()),
            "C_KEY" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(store.get("a").map(Credential::expose), Some("inline"));
        assert_eq!(store.get("b").map(Credential::expose), Some("b-secret"));
        assert!(!store.has("c"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_debug_is_redacted() {
        let store = CredentialStore::new().with("a", "sk-very-secret");
        assert!(!format!("{:?}", store).contains("sk-very-secret"));
    }
}
