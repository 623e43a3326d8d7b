//! Response cache keyed by request fingerprint
//!
//! ## Fingerprint
//!
//! Only the fields that decide *what* is being asked participate:
//! task kind, prompt, persona id and temperature. Max tokens and the history
//! excerpt are left out so near-identical calls share one entry.
//!
//! The participating fields are serialized as compact JSON with sorted keys
//! and hashed with SHA-256, so equal requests always yield byte-identical
//! fingerprints.

mod store;

pub use store::{CacheMetrics, CacheSummary, ResponseCache};

use crate::api::AiRequest;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Deterministic fingerprint of the cache-relevant request fields.
///
/// `default_temperature` is used when the request carries none (or a
/// non-finite one), so an omitted temperature and an explicit default share a
/// fingerprint. Values are clamped to the 0.0..=1.0 range the adapters send.
pub fn fingerprint(request: &AiRequest, default_temperature: f32) -> String {
    let temperature = request
        .temperature
        .filter(|t| t.is_finite())
        .unwrap_or(default_temperature)
        .clamp(0.0, 1.0);

    // BTreeMap keeps keys sorted regardless of insertion order
    let mut fields: BTreeMap<&str, Value> = BTreeMap::new();
    fields.insert("task_kind", Value::from(request.task_kind.as_str()));
    fields.insert("prompt", Value::from(request.prompt.as_str()));
    fields.insert(
        "mentor_id",
        request
            .mentor_id
            .as_deref()
            .map(Value::from)
            .unwrap_or(Value::Null),
    );
    fields.insert("temperature", Value::from(canonical_temperature(temperature)));

    let canonical = serde_json::to_string(&fields).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Widen through the shortest decimal form so 0.7f32 is keyed as 0.7
fn canonical_temperature(temperature: f32) -> f64 {
    if temperature == 0.0 {
        return 0.0;
    }
    temperature
        .to_string()
        .parse::<f64>()
        .unwrap_or(f64::from(temperature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{HistoryMessage, Role, TaskKind};

    #[test]
    fn test_identical_requests_share_fingerprint() {
        let a = AiRequest::new(TaskKind::CodeGeneration, "p1")
            .with_mentor("bill_gates")
            .with_temperature(0.3);
        let b = AiRequest::new(TaskKind::CodeGeneration, "p1")
            .with_temperature(0.3)
            .with_mentor("bill_gates");

        assert_eq!(fingerprint(&a, 0.7), fingerprint(&b, 0.7));
        assert_eq!(fingerprint(&a, 0.7).len(), 64);
    }

    #[test]
    fn test_advisory_fields_do_not_participate() {
        let base = AiRequest::new(TaskKind::Conversation, "hello");
        let varied = base
            .clone()
            .with_max_tokens(12)
            .with_user_tag("user-9")
            .with_history(vec![HistoryMessage {
                role: Role::User,
                content: "before".to_string(),
            }]);

        assert_eq!(fingerprint(&base, 0.7), fingerprint(&varied, 0.7));
    }

    #[test]
    fn test_participating_fields_change_fingerprint() {
        let base = AiRequest::new(TaskKind::Conversation, "hello");
        let fp = fingerprint(&base, 0.7);

        assert_ne!(fp, fingerprint(&base.clone().with_temperature(0.2), 0.7));
        assert_ne!(fp, fingerprint(&base.clone().with_mentor("elon_musk"), 0.7));
        assert_ne!(
            fp,
            fingerprint(&AiRequest::new(TaskKind::CreativeWriting, "hello"), 0.7)
        );
        assert_ne!(
            fp,
            fingerprint(&AiRequest::new(TaskKind::Conversation, "hello!"), 0.7)
        );
    }

    #[test]
    fn test_omitted_temperature_matches_default() {
        let implicit = AiRequest::new(TaskKind::Conversation, "hello");
        let explicit = implicit.clone().with_temperature(0.7);
        assert_eq!(fingerprint(&implicit, 0.7), fingerprint(&explicit, 0.7));
    }

    #[test]
    fn test_non_finite_temperature_falls_back_to_default() {
        let base = AiRequest::new(TaskKind::Conversation, "p1");
        let default = fingerprint(&base, 0.7);

        let mut nan = base.clone();
        nan.temperature = Some(f32::NAN);
        let mut inf = base.clone();
        inf.temperature = Some(f32::INFINITY);

        assert_eq!(fingerprint(&nan, 0.7), default);
        assert_eq!(fingerprint(&inf, 0.7), default);
        assert!(base.clone().with_temperature(f32::NAN).temperature.is_none());
    }

    #[test]
    fn test_out_of_range_temperature_is_clamped() {
        let hot = AiRequest::new(TaskKind::Conversation, "p1").with_temperature(1.5);
        let max = AiRequest::new(TaskKind::Conversation, "p1").with_temperature(1.0);
        let distinct = AiRequest::new(TaskKind::Conversation, "p1").with_temperature(0.9);

        assert_eq!(fingerprint(&hot, 0.7), fingerprint(&max, 0.7));
        assert_ne!(fingerprint(&hot, 0.7), fingerprint(&distinct, 0.7));
    }

    #[test]
    fn test_canonical_temperature() {
        assert_eq!(canonical_temperature(0.7), 0.7);
        assert_eq!(canonical_temperature(-0.0), 0.0);
        assert_eq!(canonical_temperature(1.0), 1.0);
    }
}
