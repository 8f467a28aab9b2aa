use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::services::cache::client::CacheResult;

/// Blacklist of tokens that must not be accepted again before they expire.
///
/// Contract:
/// - once `revoke` returns `Ok`, every later `is_revoked` for that id sees `true`
///   until the TTL runs out (the store is the source of truth, nothing is cached locally)
/// - `revoke` is idempotent; revoking twice is a successful no-op
/// - `Err(_)` is a backend failure; gating callers must fail closed
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn is_revoked(&self, token_id: &str) -> CacheResult<bool>;

    // `ttl` should be the token's remaining lifetime so entries outlive the token, never less.
    async fn revoke(&self, token_id: &str, ttl: Duration) -> CacheResult<()>;
}

/// Stable identifier of a raw token string: sha256 -> URL-safe base64 without padding.
///
/// Computable before the token is validated, and keeps raw tokens out of the store.
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
