//! Per-provider admission control
//!
//! Each provider has a sliding request window (requests per minute by
//! default) and a token budget that resets at the UTC day boundary.
//! Admission is advisory: providers can still refuse with their own quota
//! errors, which surface through the adapters.
//!
//! An admitted request holds a window slot until it is charged or released,
//! so concurrent callers cannot all pass `admit` before any of them charges.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::debug;

/// Static ceilings for one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub requests_per_window: u32,
    pub tokens_per_day: u64,
}

/// Why a provider was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectReason {
    /// Request window is full
    Rpm,
    /// Daily token budget is spent
    Tpd,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Rpm => f.write_str("rpm"),
            RejectReason::Tpd => f.write_str("tpd"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Reject(RejectReason),
}

/// Current usage for one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateUsage {
    pub requests_in_window: usize,
    pub tokens_today: u64,
}

#[derive(Debug, Default)]
struct RateRecord {
    requests: VecDeque<DateTime<Utc>>,
    tokens_today: u64,
    last_charged: Option<DateTime<Utc>>,
    /// Admitted but not yet charged or released
    in_flight: usize,
}

impl RateRecord {
    fn evict(&mut self, now: DateTime<Utc>, window: Duration) {
        while let Some(oldest) = self.requests.front() {
            if now - *oldest >= window {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }

    /// Reset the day counter once the UTC date has moved past the last charge
    fn roll_day(&mut self, now: DateTime<Utc>) -> bool {
        match self.last_charged {
            Some(last) if now.date_naive() > last.date_naive() => {
                self.tokens_today = 0;
                true
            }
            _ => false,
        }
    }
}

struct Slot {
    limits: RateLimits,
    record: Mutex<RateRecord>,
}

/// Rate limiter holding one record per configured provider.
///
/// The provider set is fixed at construction; each record has its own lock
/// so admissions for different providers never contend.
pub struct RateLimiter {
    window: Duration,
    slots: HashMap<String, Slot>,
}

impl RateLimiter {
    pub fn new<I, S>(window: std::time::Duration, providers: I) -> Self
    where
        I: IntoIterator<Item = (S, RateLimits)>,
        S: Into<String>,
    {
        let window = Duration::from_std(window).unwrap_or_else(|_| Duration::seconds(60));
        let slots = providers
            .into_iter()
            .map(|(name, limits)| {
                (
                    name.into(),
                    Slot {
                        limits,
                        record: Mutex::new(RateRecord::default()),
                    },
                )
            })
            .collect();

        Self { window, slots }
    }

    /// Decide whether `provider` may be called now. An admitted request
    /// holds a window slot until [`charge`](Self::charge) or
    /// [`release`](Self::release).
    pub fn admit(&self, provider: &str) -> Admission {
        self.admit_at(provider, Utc::now())
    }

    /// Record one completed request and its token cost
    pub fn charge(&self, provider: &str, tokens: u64) {
        self.charge_at(provider, tokens, Utc::now());
    }

    /// Give back an admitted slot whose request was never served
    pub fn release(&self, provider: &str) {
        let Some(slot) = self.slots.get(provider) else {
            return;
        };
        let mut record = slot.record.lock().unwrap_or_else(|e| e.into_inner());
        record.in_flight = record.in_flight.saturating_sub(1);
    }

    /// Admit `provider` and hold the slot until the returned reservation is
    /// charged; dropping it releases the slot
    pub(crate) fn reserve<'a>(
        &'a self,
        provider: &'a str,
    ) -> Result<Reservation<'a>, RejectReason> {
        match self.admit(provider) {
            Admission::Admit => Ok(Reservation {
                limiter: self,
                provider,
                open: true,
            }),
            Admission::Reject(reason) => Err(reason),
        }
    }

    pub fn usage(&self, provider: &str) -> Option<RateUsage> {
        let slot = self.slots.get(provider)?;
        let record = slot.record.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now();
        let requests_in_window = record
            .requests
            .iter()
            .filter(|ts| now - **ts < self.window)
            .count();

        Some(RateUsage {
            requests_in_window,
            tokens_today: record.tokens_today,
        })
    }

    pub(crate) fn admit_at(&self, provider: &str, now: DateTime<Utc>) -> Admission {
        let Some(slot) = self.slots.get(provider) else {
            debug!(provider, "no rate limits registered, admitting");
            return Admission::Admit;
        };

        let mut record = slot.record.lock().unwrap_or_else(|e| e.into_inner());

        if record.roll_day(now) {
            debug!(provider, "token-day counter reset");
        }
        record.evict(now, self.window);

        if record.requests.len() + record.in_flight >= slot.limits.requests_per_window as usize {
            return Admission::Reject(RejectReason::Rpm);
        }
        if record.tokens_today >= slot.limits.tokens_per_day {
            return Admission::Reject(RejectReason::Tpd);
        }

        record.in_flight += 1;
        Admission::Admit
    }

    pub(crate) fn charge_at(&self, provider: &str, tokens: u64, now: DateTime<Utc>) {
        let Some(slot) = self.slots.get(provider) else {
            return;
        };

        let mut record = slot.record.lock().unwrap_or_else(|e| e.into_inner());

        record.roll_day(now);
        record.evict(now, self.window);
        record.in_flight = record.in_flight.saturating_sub(1);
        record.requests.push_back(now);
        // Charges without a prior admit can overshoot; keep only the newest entries
        while record.requests.len() > slot.limits.requests_per_window as usize {
            record.requests.pop_front();
        }
        record.tokens_today = record.tokens_today.saturating_add(tokens);
        record.last_charged = Some(now);
    }
}

/// An admitted window slot, see [`RateLimiter::reserve`]
pub(crate) struct Reservation<'a> {
    limiter: &'a RateLimiter,
    provider: &'a str,
    open: bool,
}

impl Reservation<'_> {
    pub(crate) fn charge(mut self, tokens: u64) {
        self.open = false;
        self.limiter.charge(self.provider, tokens);
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.open {
            self.limiter.release(self.provider);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn limiter(rpm: u32, tpd: u64) -> RateLimiter {
        RateLimiter::new(
            std::time::Duration::from_secs(60),
            [(
                "a",
                RateLimits {
                    requests_per_window: rpm,
                    tokens_per_day: tpd,
                },
            )],
        )
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_rpm_window() {
        let limiter = limiter(2, 1_000_000);

        limiter.charge_at("a", 10, at(12, 0, 0));
        assert_eq!(limiter.admit_at("a", at(12, 0, 1)), Admission::Admit);
        limiter.charge_at("a", 10, at(12, 0, 1));

        assert_eq!(
            limiter.admit_at("a", at(12, 0, 30)),
            Admission::Reject(RejectReason::Rpm)
        );
        // First entry leaves the window after 60s
        assert_eq!(limiter.admit_at("a", at(12, 1, 0)), Admission::Admit);
    }

    #[test]
    fn test_tpd_budget() {
        let limiter = limiter(100, 500);

        limiter.charge_at("a", 499, at(10, 0, 0));
        assert_eq!(limiter.admit_at("a", at(10, 5, 0)), Admission::Admit);

        limiter.charge_at("a", 1, at(10, 5, 0));
        assert_eq!(
            limiter.admit_at("a", at(10, 6, 0)),
            Admission::Reject(RejectReason::Tpd)
        );
    }

    #[test]
    fn test_day_boundary_resets_tokens() {
        let limiter = limiter(100, 500);

        limiter.charge_at("a", 500, at(23, 59, 0));
        assert_eq!(
            limiter.admit_at("a", at(23, 59, 30)),
            Admission::Reject(RejectReason::Tpd)
        );

        let next_day = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        assert_eq!(limiter.admit_at("a", next_day), Admission::Admit);
    }

    #[test]
    fn test_window_never_exceeds_ceiling() {
        let limiter = limiter(3, u64::MAX);

        for _ in 0..3 {
            assert_eq!(limiter.admit_at("a", at(8, 0, 0)), Admission::Admit);
        }
        for i in 0..5 {
            limiter.charge_at("a", 1, at(8, 0, i));
        }

        let record = limiter.slots["a"].record.lock().unwrap();
        assert_eq!(record.requests.len(), 3);
        assert_eq!(record.tokens_today, 5);
    }

    #[test]
    fn test_uncharged_admissions_hold_the_window() {
        let limiter = limiter(2, u64::MAX);

        assert_eq!(limiter.admit_at("a", at(9, 0, 0)), Admission::Admit);
        assert_eq!(limiter.admit_at("a", at(9, 0, 0)), Admission::Admit);
        assert_eq!(
            limiter.admit_at("a", at(9, 0, 0)),
            Admission::Reject(RejectReason::Rpm)
        );

        // A failed request gives its slot back without entering the log
        limiter.release("a");
        assert_eq!(limiter.admit_at("a", at(9, 0, 1)), Admission::Admit);

        let record = limiter.slots["a"].record.lock().unwrap();
        assert!(record.requests.is_empty());
        assert_eq!(record.in_flight, 2);
    }

    #[test]
    fn test_dropped_reservation_releases_slot() {
        let limiter = limiter(1, u64::MAX);

        let held = limiter.reserve("a").unwrap();
        assert_eq!(limiter.reserve("a").err(), Some(RejectReason::Rpm));
        drop(held);

        let again = limiter.reserve("a").unwrap();
        again.charge(7);
        assert_eq!(limiter.reserve("a").err(), Some(RejectReason::Rpm));
        assert_eq!(limiter.usage("a").unwrap().tokens_today, 7);
    }

    #[test]
    fn test_unknown_provider_is_admitted() {
        let limiter = limiter(1, 1);
        assert_eq!(limiter.admit("other"), Admission::Admit);
        assert!(limiter.usage("other").is_none());
    }

    #[test]
    fn test_usage_reports_live_window() {
        let limiter = limiter(5, 1000);
        limiter.charge("a", 42);

        let usage = limiter.usage("a").unwrap();
        assert_eq!(usage.requests_in_window, 1);
        assert_eq!(usage.tokens_today, 42);
    }
}
