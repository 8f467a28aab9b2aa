use std::time::Duration;

use async_trait::async_trait;

use crate::services::cache::client::CacheResult;

/// The single live refresh token per account.
///
/// `put` overwrites: issuing a new refresh token makes the previous one unretrievable.
/// `take_if_matches` redeems a token at most once, even under concurrent callers.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn get(&self, account_id: &str) -> CacheResult<Option<String>>;

    async fn put(&self, account_id: &str, token: &str, ttl: Duration) -> CacheResult<()>;

    async fn invalidate(&self, account_id: &str) -> CacheResult<()>;

    // Atomically remove the session if it is still `token`. `Ok(false)` means superseded or gone.
    async fn take_if_matches(&self, account_id: &str, token: &str) -> CacheResult<bool>;
}
