//! ABOUTME: Credential handling for providers — static API keys and cached short-lived bearer tokens

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fetches a fresh bearer token from wherever the provider's auth flow
/// issues one (e.g. a workload-identity exchange endpoint).
#[async_trait]
pub trait BearerTokenSource: Send + Sync {
    async fn fetch(&self) -> Result<(String, DateTime<Utc>)>;
}

/// How a provider authenticates outbound requests.
#[derive(Clone)]
pub enum Auth {
    ApiKey(String),
    Bearer(Arc<CachedBearerToken>),
}

impl Auth {
    pub async fn header_value(&self) -> Result<String> {
        match self {
            Self::ApiKey(key) => Ok(format!("Bearer {key}")),
            Self::Bearer(cached) => Ok(format!("Bearer {}", cached.token().await?)),
        }
    }
}

/// Caches a bearer token, refreshing it once it is within `refresh_buffer`
/// of expiry rather than on every call.
pub struct CachedBearerToken {
    source: Arc<dyn BearerTokenSource>,
    refresh_buffer: chrono::Duration,
    cached: RwLock<Option<(String, DateTime<Utc>)>>,
}

impl CachedBearerToken {
    #[must_use]
    pub fn new(source: Arc<dyn BearerTokenSource>, refresh_buffer: chrono::Duration) -> Self {
        Self {
            source,
            refresh_buffer,
            cached: RwLock::new(None),
        }
    }

    pub async fn token(&self) -> Result<String> {
        {
            let guard = self.cached.read().await;
            if let Some((token, expires_at)) = guard.as_ref() {
                if *expires_at - Utc::now() > self.refresh_buffer {
                    return Ok(token.clone());
                }
            }
        }
        let (token, expires_at) = self.source.fetch().await?;
        let mut guard = self.cached.write().await;
        *guard = Some((token.clone(), expires_at));
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingSource {
        calls: AtomicU32,
        ttl: chrono::Duration,
    }

    #[async_trait]
    impl BearerTokenSource for CountingSource {
        async fn fetch(&self) -> Result<(String, DateTime<Utc>)> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok((format!("token-{n}"), Utc::now() + self.ttl))
        }
    }

    #[tokio::test]
    async fn reuses_a_token_until_it_nears_expiry() {
        let source = Arc::new(CountingSource {
            calls: AtomicU32::new(0),
            ttl: chrono::Duration::minutes(10),
        });
        let cached = CachedBearerToken::new(source, chrono::Duration::minutes(1));
        let first = cached.token().await.unwrap();
        let second = cached.token().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn refreshes_once_within_the_buffer() {
        let source = Arc::new(CountingSource {
            calls: AtomicU32::new(0),
            ttl: -chrono::Duration::seconds(1),
        });
        let cached = CachedBearerToken::new(source, chrono::Duration::minutes(1));
        let first = cached.token().await.unwrap();
        let second = cached.token().await.unwrap();
        assert_ne!(first, second);
    }
}
