//! ABOUTME: Per-vendor token bucket rate limiter for embedding and retrieval calls

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TokenBucketConfig {
    pub capacity: f64,
    pub refill_per_second: f64,
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self {
            capacity: 10.0,
            refill_per_second: 5.0,
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    config: TokenBucketConfig,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(config: TokenBucketConfig) -> Self {
        Self {
            tokens: config.capacity,
            config,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let elapsed = self.last_refill.elapsed().as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.config.refill_per_second).min(self.config.capacity);
        self.last_refill = Instant::now();
    }

    fn try_acquire(&mut self, cost: f64) -> bool {
        self.refill();
        if self.tokens >= cost {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }
}

/// One token bucket per vendor name (`"openai"`, `"azure-search"`, ...),
/// created lazily on first use with that vendor's configured rate.
pub struct RateLimiter {
    buckets: Arc<DashMap<String, Mutex<TokenBucket>>>,
    default_config: TokenBucketConfig,
}

impl RateLimiter {
    #[must_use]
    pub fn new(default_config: TokenBucketConfig) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            default_config,
        }
    }

    pub fn configure(&self, vendor: &str, config: TokenBucketConfig) {
        self.buckets.insert(vendor.to_string(), Mutex::new(TokenBucket::new(config)));
    }

    /// Attempt to spend `cost` tokens against `vendor`'s bucket. Returns
    /// `false` when the caller should back off before issuing the request.
    pub fn try_acquire(&self, vendor: &str, cost: f64) -> bool {
        let bucket = self
            .buckets
            .entry(vendor.to_string())
            .or_insert_with(|| Mutex::new(TokenBucket::new(self.default_config.clone())));
        let result = bucket.lock().try_acquire(cost);
        result
    }

    /// Blocks (asynchronously) until `vendor`'s bucket can afford `cost`,
    /// polling at a fixed interval derived from the refill rate.
    pub async fn acquire(&self, vendor: &str, cost: f64) {
        loop {
            if self.try_acquire(vendor, cost) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(TokenBucketConfig::default())
    }
}
