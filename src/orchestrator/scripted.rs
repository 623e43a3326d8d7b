//! Adapter with canned behavior for orchestrator tests

use crate::api::{AdapterError, AdapterKind, AiRequest, Credential, ProviderAdapter};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

enum Behavior {
    Reply(String),
    Fail(fn() -> AdapterError),
    /// Never completes; only a timeout or cancellation ends the call
    Hang,
}

pub(crate) struct ScriptedAdapter {
    behavior: Behavior,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, AiRequest)>>,
}

impl ScriptedAdapter {
    fn with(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn replying(text: &str) -> Arc<Self> {
        Self::with(Behavior::Reply(text.to_string()))
    }

    pub(crate) fn failing(make: fn() -> AdapterError) -> Arc<Self> {
        Self::with(Behavior::Fail(make))
    }

    pub(crate) fn hanging() -> Arc<Self> {
        Self::with(Behavior::Hang)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_system_prompt(&self) -> Option<String> {
        self.seen.lock().unwrap().last().map(|(system, _)| system.clone())
    }

    pub(crate) fn last_request(&self) -> Option<AiRequest> {
        self.seen.lock().unwrap().last().map(|(_, request)| request.clone())
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    async fn invoke(
        &self,
        request: &AiRequest,
        system_prompt: &str,
        _credential: &Credential,
    ) -> Result<String, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), request.clone()));

        match &self.behavior {
            Behavior::Reply(text) => Ok(text.clone()),
            Behavior::Fail(make) => Err(make()),
            Behavior::Hang => Ok(std::future::pending::<String>().await),
        }
    }

    fn kind(&self) -> AdapterKind {
        AdapterKind::OpenAi
    }
}
