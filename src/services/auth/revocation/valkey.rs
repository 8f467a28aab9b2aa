use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::services::auth::revocation::store::RevocationStore;
use crate::services::cache::{CacheClient, ValkeyClient, client::CacheResult};

/// Valkey-backed revocation store (Redis protocol).
///
/// Keys: `<prefix>:<token-id>`, value `"1"`, expiring with the token.
#[derive(Clone)]
pub struct ValkeyRevocationStore<C: CacheClient> {
    cache: Arc<C>,
    // Optional key prefix to avoid collisions across environments
    prefix: String,
}

impl ValkeyRevocationStore<ValkeyClient> {
    pub fn new(client: ValkeyClient) -> Self {
        Self::new_with_cache(Arc::new(client), "auth:revoked")
    }
}

impl<C: CacheClient> ValkeyRevocationStore<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, token_id: &str) -> String {
        format!("{}:{}", self.prefix, token_id)
    }
}

#[async_trait]
impl<C: CacheClient> RevocationStore for ValkeyRevocationStore<C> {
    async fn is_revoked(&self, token_id: &str) -> CacheResult<bool> {
        let found = self.cache.get_string(&self.key(token_id)).await?;
        Ok(found.is_some())
    }

    async fn revoke(&self, token_id: &str, ttl: Duration) -> CacheResult<()> {
        // SET <key> "1" NX EX <ttl>
        // First write wins, so a repeated revoke can never shorten the entry's life.
        let newly = self
            .cache
            .set_if_absent_with_ttl(&self.key(token_id), "1", ttl)
            .await?;

        debug!(
            backend = self.cache.backend_name(),
            newly,
            ttl_secs = ttl.as_secs(),
            "token revoked"
        );
        Ok(())
    }
}
