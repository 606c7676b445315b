//! # Bearer Token Management
//!
//! Token acquisition and caching for the remote tabular store.
//!
//! ## Token Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Token Lifecycle                              │
//! │                                                                     │
//! │  SheetsClient                TokenCache            AuthProvider     │
//! │       │                          │                      │           │
//! │       │  bearer_token()          │                      │           │
//! │       │─────────────────────────►│                      │           │
//! │       │                          │ cached & fresh? ──── yes ─► ret  │
//! │       │                          │                      │           │
//! │       │                          │  fetch_token()       │           │
//! │       │                          │─────────────────────►│           │
//! │       │                          │◄─────────────────────│           │
//! │       │◄─────────────────────────│  token + expiry      │           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache refreshes slightly before expiry so an in-flight request never
//! carries a token that dies mid-call. The concrete provider (service
//! account, OAuth, whatever) is injected; the engine only sees the trait.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};

/// Margin before token expiration to trigger refresh (60 seconds).
const REFRESH_MARGIN_SECS: u64 = 60;

// =============================================================================
// Auth Provider
// =============================================================================

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub token: String,
    /// How long the token is valid from the moment it was issued.
    pub expires_in: Duration,
}

/// External token source.
///
/// Failures surface as [`SyncError::Auth`]; during initialization that is
/// fatal, in steady state the caller logs and retries on the next request.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn fetch_token(&self) -> SyncResult<BearerToken>;
}

// =============================================================================
// Token Cache
// =============================================================================

/// Cached token with its local expiry deadline.
#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Expired or close enough to expiry that a refresh is due.
    fn needs_refresh(&self) -> bool {
        Instant::now() + Duration::from_secs(REFRESH_MARGIN_SECS) >= self.expires_at
    }
}

/// Caches bearer tokens and refreshes them slightly early.
pub struct TokenCache {
    provider: Arc<dyn AuthProvider>,
    token: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        TokenCache {
            provider,
            token: RwLock::new(None),
        }
    }

    /// Returns a valid bearer token, fetching or refreshing as needed.
    pub async fn bearer_token(&self) -> SyncResult<String> {
        // Fast path: a fresh token under the read lock.
        {
            let guard = self.token.read().await;
            if let Some(cached) = guard.as_ref() {
                if !cached.needs_refresh() {
                    return Ok(cached.token.clone());
                }
            }
        }

        // Slow path: re-check under the write lock, another caller may have
        // refreshed while we waited.
        let mut guard = self.token.write().await;
        if let Some(cached) = guard.as_ref() {
            if !cached.needs_refresh() {
                return Ok(cached.token.clone());
            }
            debug!("Bearer token near expiry, refreshing");
        }

        let issued = self.provider.fetch_token().await?;
        if issued.token.trim().is_empty() {
            return Err(SyncError::Auth("provider returned an empty token".to_string()));
        }

        info!(
            expires_in_secs = issued.expires_in.as_secs(),
            "Bearer token acquired"
        );

        let cached = CachedToken {
            token: issued.token.clone(),
            expires_at: Instant::now() + issued.expires_in,
        };
        *guard = Some(cached);
        Ok(issued.token)
    }

    /// Drops the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingProvider {
        calls: AtomicU32,
        ttl: Duration,
    }

    #[async_trait]
    impl AuthProvider for CountingProvider {
        async fn fetch_token(&self) -> SyncResult<BearerToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(BearerToken {
                token: format!("token-{n}"),
                expires_in: self.ttl,
            })
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl AuthProvider for FailingProvider {
        async fn fetch_token(&self) -> SyncResult<BearerToken> {
            Err(SyncError::Auth("key rejected".to_string()))
        }
    }

    #[tokio::test]
    async fn test_token_is_cached_until_expiry() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicU32::new(0),
            ttl: Duration::from_secs(3600),
        });
        let cache = TokenCache::new(provider.clone());

        assert_eq!(cache.bearer_token().await.unwrap(), "token-1");
        assert_eq!(cache.bearer_token().await.unwrap(), "token-1");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_lived_token_refreshes_early() {
        // Within the 60s refresh margin from the moment it is issued.
        let provider = Arc::new(CountingProvider {
            calls: AtomicU32::new(0),
            ttl: Duration::from_secs(30),
        });
        let cache = TokenCache::new(provider.clone());

        assert_eq!(cache.bearer_token().await.unwrap(), "token-1");
        assert_eq!(cache.bearer_token().await.unwrap(), "token-2");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reauth() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicU32::new(0),
            ttl: Duration::from_secs(3600),
        });
        let cache = TokenCache::new(provider.clone());

        cache.bearer_token().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.bearer_token().await.unwrap(), "token-2");
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_as_auth_error() {
        let cache = TokenCache::new(Arc::new(FailingProvider));
        let err = cache.bearer_token().await.unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
    }
}
