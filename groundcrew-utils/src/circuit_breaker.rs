//! ABOUTME: Per-upstream circuit breaker that opens on repeated or slow failures

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub open_duration: Duration,
    pub slow_call_threshold: u32,
    pub slow_call_duration: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            success_threshold: 2,
            open_duration: Duration::from_secs(15),
            slow_call_threshold: 3,
            slow_call_duration: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerStats {
    failures: AtomicU64,
    successes: AtomicU64,
    slow_calls: AtomicU64,
    total_calls: AtomicU64,
}

/// Tracks the health of a single upstream (one LLM provider, one search
/// backend, ...) and blocks calls once it has been failing or slow enough
/// that retrying is more likely to waste the turn deadline than help it.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    state: RwLock<BreakerState>,
    state_changed_at: RwLock<Instant>,
    stats: BreakerStats,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, BreakerConfig::default())
    }

    #[must_use]
    pub fn with_config(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: RwLock::new(BreakerState::Closed),
            state_changed_at: RwLock::new(Instant::now()),
            stats: BreakerStats::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> BreakerState {
        *self.state.read()
    }

    /// Whether a call may proceed. Transitions `Open` → `HalfOpen` once the
    /// open duration has elapsed, as a side effect of the check.
    pub fn can_execute(&self) -> bool {
        match self.state() {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                if self.state_changed_at.read().elapsed() >= self.config.open_duration {
                    self.transition_to(BreakerState::HalfOpen);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self, duration: Duration) {
        self.stats.successes.fetch_add(1, Ordering::Relaxed);
        self.stats.total_calls.fetch_add(1, Ordering::Relaxed);

        if duration >= self.config.slow_call_duration {
            let slow = self.stats.slow_calls.fetch_add(1, Ordering::Relaxed) + 1;
            if self.state() == BreakerState::Closed && slow >= u64::from(self.config.slow_call_threshold) {
                self.transition_to(BreakerState::Open);
                return;
            }
        }

        if self.state() == BreakerState::HalfOpen {
            let successes = self.stats.successes.load(Ordering::Relaxed);
            if successes >= u64::from(self.config.success_threshold) {
                self.transition_to(BreakerState::Closed);
            }
        }
    }

    pub fn record_failure(&self) {
        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        self.stats.total_calls.fetch_add(1, Ordering::Relaxed);

        match self.state() {
            BreakerState::Closed => {
                let failures = self.stats.failures.load(Ordering::Relaxed);
                if failures >= u64::from(self.config.failure_threshold) {
                    self.transition_to(BreakerState::Open);
                }
            }
            BreakerState::HalfOpen => self.transition_to(BreakerState::Open),
            BreakerState::Open => {}
        }
    }

    fn transition_to(&self, new_state: BreakerState) {
        let mut state = self.state.write();
        if *state == new_state {
            return;
        }
        info!(breaker = %self.name, from = ?*state, to = ?new_state, "circuit breaker transition");
        *state = new_state;
        *self.state_changed_at.write() = Instant::now();
        match new_state {
            BreakerState::Closed => {
                self.stats.failures.store(0, Ordering::Relaxed);
                self.stats.successes.store(0, Ordering::Relaxed);
                self.stats.slow_calls.store(0, Ordering::Relaxed);
            }
            BreakerState::HalfOpen => self.stats.successes.store(0, Ordering::Relaxed),
            BreakerState::Open => {}
        }
    }

    #[must_use]
    pub fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            state: self.state(),
            failures: self.stats.failures.load(Ordering::Relaxed),
            successes: self.stats.successes.load(Ordering::Relaxed),
            total_calls: self.stats.total_calls.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub state: BreakerState,
    pub failures: u64,
    pub successes: u64,
    pub total_calls: u64,
}

/// One breaker per named upstream, created on first use.
pub struct CircuitBreakerManager {
    breakers: Arc<DashMap<String, Arc<CircuitBreaker>>>,
    default_config: BreakerConfig,
}

impl CircuitBreakerManager {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BreakerConfig::default())
    }

    #[must_use]
    pub fn with_config(default_config: BreakerConfig) -> Self {
        Self {
            breakers: Arc::new(DashMap::new()),
            default_config,
        }
    }

    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::with_config(name, self.default_config.clone())))
            .clone()
    }
}

impl Default for CircuitBreakerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_failure_threshold() {
        let breaker = CircuitBreaker::new("test");
        for _ in 0..3 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(!breaker.can_execute());
    }

    #[test]
    fn half_open_reopens_on_any_failure() {
        let config = BreakerConfig {
            failure_threshold: 1,
            open_duration: Duration::from_millis(0),
            ..BreakerConfig::default()
        };
        let breaker = CircuitBreaker::with_config("test", config);
        breaker.record_failure();
        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn manager_reuses_breaker_per_name() {
        let manager = CircuitBreakerManager::new();
        let a = manager.get_or_create("openai");
        let b = manager.get_or_create("openai");
        a.record_failure();
        assert_eq!(b.stats().failures, 1);
    }
}
