//! Per-provider health tracking: success rate, EWMA latency, last failure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Default EWMA weight for the newest latency sample
pub const DEFAULT_EWMA_ALPHA: f64 = 0.5;

/// Result of one provider attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Success { latency_ms: u64 },
    Failure,
}

#[derive(Debug, Clone, Default)]
struct HealthRecord {
    attempts: u64,
    successes: u64,
    /// None until the first successful call
    ewma_latency_ms: Option<f64>,
    last_failure: Option<DateTime<Utc>>,
}

impl HealthRecord {
    fn record(&mut self, outcome: Outcome, alpha: f64, now: DateTime<Utc>) {
        self.attempts += 1;
        match outcome {
            Outcome::Success { latency_ms } => {
                self.successes += 1;
                let measured = latency_ms as f64;
                self.ewma_latency_ms = Some(match self.ewma_latency_ms {
                    // First observation replaces the seed
                    None => measured,
                    Some(old) => alpha * measured + (1.0 - alpha) * old,
                });
            }
            Outcome::Failure => {
                self.last_failure = Some(now);
            }
        }
    }

    fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            attempts: self.attempts,
            successes: self.successes,
            failures: self.attempts - self.successes,
            success_rate: if self.attempts == 0 {
                0.0
            } else {
                self.successes as f64 / self.attempts as f64
            },
            ewma_latency_ms: self.ewma_latency_ms,
            last_failure: self.last_failure,
        }
    }
}

/// Read-only view of one provider's health
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub ewma_latency_ms: Option<f64>,
    pub last_failure: Option<DateTime<Utc>>,
}

impl std::fmt::Display for HealthSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} ok ({:.1}%)",
            self.successes,
            self.attempts,
            self.success_rate * 100.0
        )?;
        if let Some(latency) = self.ewma_latency_ms {
            write!(f, ", ~{:.0} ms", latency)?;
        }
        if let Some(ts) = self.last_failure {
            write!(f, ", last failure {}", ts.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        Ok(())
    }
}

/// Thread-safe health tracker
pub struct HealthTracker {
    alpha: f64,
    records: Mutex<HashMap<String, HealthRecord>>,
}

impl HealthTracker {
    pub fn new(alpha: f64) -> Self {
        let alpha = if alpha > 0.0 && alpha <= 1.0 {
            alpha
        } else {
            DEFAULT_EWMA_ALPHA
        };
        Self {
            alpha,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn record(&self, provider: &str, outcome: Outcome) {
        self.record_at(provider, outcome, Utc::now());
    }

    pub fn record_success(&self, provider: &str, latency_ms: u64) {
        self.record(provider, Outcome::Success { latency_ms });
    }

    pub fn record_failure(&self, provider: &str) {
        self.record(provider, Outcome::Failure);
    }

    pub(crate) fn record_at(&self, provider: &str, outcome: Outcome, now: DateTime<Utc>) {
        let alpha = self.alpha;
        self.lock()
            .entry(provider.to_string())
            .or_default()
            .record(outcome, alpha, now);
    }

    /// Snapshot for one provider; zeros if it was never attempted
    pub fn snapshot(&self, provider: &str) -> HealthSnapshot {
        self.lock()
            .get(provider)
            .map(HealthRecord::snapshot)
            .unwrap_or_default()
    }

    /// Snapshots of every provider seen so far
    pub fn snapshots(&self) -> BTreeMap<String, HealthSnapshot> {
        self.lock()
            .iter()
            .map(|(name, record)| (name.clone(), record.snapshot()))
            .collect()
    }

    /// True while the last failure is younger than `window`
    pub fn is_circuit_open(&self, provider: &str, window: Duration) -> bool {
        self.is_circuit_open_at(provider, window, Utc::now())
    }

    pub(crate) fn is_circuit_open_at(
        &self,
        provider: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> bool {
        let Ok(window) = chrono::Duration::from_std(window) else {
            return false;
        };
        self.lock()
            .get(provider)
            .and_then(|record| record.last_failure)
            .is_some_and(|failed_at| now - failed_at < window)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, HealthRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new(DEFAULT_EWMA_ALPHA)
    }
}
