use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::services::auth::refresh::store::RefreshTokenStore;
use crate::services::cache::{CacheClient, ValkeyClient, client::CacheResult};

/// Valkey-backed refresh session store.
///
/// Keys: `<prefix>:<account-id>`, value: the raw refresh token.
#[derive(Clone)]
pub struct ValkeyRefreshTokenStore<C: CacheClient> {
    cache: Arc<C>,
    prefix: String,
}

impl ValkeyRefreshTokenStore<ValkeyClient> {
    pub fn new(client: ValkeyClient) -> Self {
        Self::new_with_cache(Arc::new(client), "auth:refresh")
    }
}

impl<C: CacheClient> ValkeyRefreshTokenStore<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    fn key(&self, account_id: &str) -> String {
        format!("{}:{}", self.prefix, account_id)
    }
}

#[async_trait]
impl<C: CacheClient> RefreshTokenStore for ValkeyRefreshTokenStore<C> {
    async fn get(&self, account_id: &str) -> CacheResult<Option<String>> {
        self.cache.get_string(&self.key(account_id)).await
    }

    async fn put(&self, account_id: &str, token: &str, ttl: Duration) -> CacheResult<()> {
        self.cache
            .set_with_ttl(&self.key(account_id), token, ttl)
            .await
    }

    async fn invalidate(&self, account_id: &str) -> CacheResult<()> {
        let removed = self.cache.del(&self.key(account_id)).await?;
        debug!(account_id, removed, "refresh session invalidated");
        Ok(())
    }

    async fn take_if_matches(&self, account_id: &str, token: &str) -> CacheResult<bool> {
        self.cache.delete_if_equals(&self.key(account_id), token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryCache;

    fn store() -> ValkeyRefreshTokenStore<MemoryCache> {
        ValkeyRefreshTokenStore::new_with_cache(Arc::new(MemoryCache::default()), "auth:refresh")
    }

    #[tokio::test]
    async fn second_put_replaces_the_first() {
        let store = store();
        let ttl = Duration::from_secs(60);

        store.put("7", "first", ttl).await.unwrap();
        store.put("7", "second", ttl).await.unwrap();

        assert_eq!(store.get("7").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn accounts_do_not_share_sessions() {
        let store = store();
        let ttl = Duration::from_secs(60);

        store.put("7", "seven", ttl).await.unwrap();
        store.put("8", "eight", ttl).await.unwrap();

        assert_eq!(store.get("7").await.unwrap().as_deref(), Some("seven"));
        assert_eq!(store.get("8").await.unwrap().as_deref(), Some("eight"));
    }

    #[tokio::test]
    async fn invalidate_removes_the_session_and_is_repeatable() {
        let store = store();
        store.put("7", "t", Duration::from_secs(60)).await.unwrap();

        store.invalidate("7").await.unwrap();
        store.invalidate("7").await.unwrap();

        assert_eq!(store.get("7").await.unwrap(), None);
    }

    #[tokio::test]
    async fn take_only_redeems_the_current_token_once() {
        let store = store();
        store.put("7", "current", Duration::from_secs(60)).await.unwrap();

        assert!(!store.take_if_matches("7", "stale").await.unwrap());
        assert_eq!(store.get("7").await.unwrap().as_deref(), Some("current"));

        assert!(store.take_if_matches("7", "current").await.unwrap());
        assert!(!store.take_if_matches("7", "current").await.unwrap());
        assert_eq!(store.get("7").await.unwrap(), None);
    }
}
