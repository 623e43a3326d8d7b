//! In-process response store with optional LRU bound

use crate::api::AiResponse;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// Metrics for cache performance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheMetrics {
    /// Total cache hits
    pub cache_hits: u64,
    /// Total cache misses
    pub cache_misses: u64,
    /// Responses stored
    pub cache_writes: u64,
    /// Entries dropped by the LRU bound
    pub evictions: u64,
    /// Cache hit rate (0.0 - 1.0)
    pub hit_rate: f64,
}

impl CacheMetrics {
    fn record_hit(&mut self) {
        self.cache_hits += 1;
        self.update_hit_rate();
    }

    fn record_miss(&mut self) {
        self.cache_misses += 1;
        self.update_hit_rate();
    }

    fn update_hit_rate(&mut self) {
        let total = self.cache_hits + self.cache_misses;
        self.hit_rate = if total > 0 {
            self.cache_hits as f64 / total as f64
        } else {
            0.0
        };
    }
}

impl std::fmt::Display for CacheMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Cache Metrics ===")?;
        writeln!(f, "Cache hits: {}", self.cache_hits)?;
        writeln!(f, "Cache misses: {}", self.cache_misses)?;
        writeln!(f, "Hit rate: {:.1}%", self.hit_rate * 100.0)?;
        writeln!(f, "Writes: {}", self.cache_writes)?;
        writeln!(f, "Evictions: {}", self.evictions)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    response: AiResponse,
    /// Logical clock value of the last access
    last_accessed: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    metrics: CacheMetrics,
    clock: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_accessed)
            .map(|(k, _)| k.clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.metrics.evictions += 1;
        }
    }
}

/// Fingerprint -> response store.
///
/// Entries never expire; with a capacity set, the least recently used entry
/// is dropped to make room for a new one.
pub struct ResponseCache {
    state: Mutex<CacheState>,
    capacity: Option<usize>,
}

impl ResponseCache {
    /// Unbounded cache
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: None,
        }
    }

    /// Cache holding at most `capacity` entries (0 means unbounded)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity: (capacity > 0).then_some(capacity),
        }
    }

    pub fn lookup(&self, fingerprint: &str) -> Option<AiResponse> {
        let mut state = self.lock();
        let now = state.tick();

        let found = state.entries.get_mut(fingerprint).map(|entry| {
            entry.last_accessed = now;
            entry.response.clone()
        });

        match found {
            Some(_) => state.metrics.record_hit(),
            None => state.metrics.record_miss(),
        }

        found
    }

    pub fn store(&self, fingerprint: impl Into<String>, response: AiResponse) {
        let fingerprint = fingerprint.into();
        let mut state = self.lock();
        let now = state.tick();

        if let Some(capacity) = self.capacity {
            if !state.entries.contains_key(&fingerprint) && state.entries.len() >= capacity {
                state.evict_lru();
            }
        }

        state.entries.insert(
            fingerprint,
            CacheEntry {
                response,
                last_accessed: now,
            },
        );
        state.metrics.cache_writes += 1;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn get_metrics(&self) -> CacheMetrics {
        self.lock().metrics.clone()
    }

    pub fn summary(&self) -> CacheSummary {
        let state = self.lock();
        CacheSummary {
            entry_count: state.entries.len(),
            capacity: self.capacity,
            total_hits: state.metrics.cache_hits,
            total_misses: state.metrics.cache_misses,
            hit_rate: state.metrics.hit_rate,
            evictions: state.metrics.evictions,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of cache state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheSummary {
    pub entry_count: usize,
    pub capacity: Option<usize>,
    pub total_hits: u64,
    pub total_misses: u64,
    pub hit_rate: f64,
    pub evictions: u64,
}

impl std::fmt::Display for CacheSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Cache Summary ===")?;
        match self.capacity {
            Some(cap) => writeln!(f, "Cached entries: {} / {}", self.entry_count, cap)?,
            None => writeln!(f, "Cached entries: {}", self.entry_count)?,
        }
        writeln!(f, "Total hits: {}", self.total_hits)?;
        writeln!(f, "Total misses: {}", self.total_misses)?;
        writeln!(f, "Hit rate: {:.1}%", self.hit_rate * 100.0)?;
        writeln!(f, "Evictions: {}", self.evictions)?;
        Ok(())
    }
}
