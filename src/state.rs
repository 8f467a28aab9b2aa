/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - token codec / token service / revocation & refresh stores / account store / gate policy
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;
use std::time::Duration;

use crate::repos::account_repo::AccountStore;
use crate::services::auth::refresh::RefreshTokenStore;
use crate::services::auth::revocation::RevocationStore;
use crate::services::auth::{Clock, TokenCodec, TokenService};

#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub tokens: Arc<TokenService>,
    pub revocations: Arc<dyn RevocationStore>,
    pub refresh_tokens: Arc<dyn RefreshTokenStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub gate: GatePolicy,
    pub clock: Arc<dyn Clock>,
}

/// Which paths bypass the gate, and how long a stage may wait on a store.
#[derive(Clone, Debug)]
pub struct GatePolicy {
    excluded_paths: Arc<[String]>,
    pub store_timeout: Duration,
}

impl GatePolicy {
    pub fn new(excluded_paths: Vec<String>, store_timeout: Duration) -> Self {
        Self {
            excluded_paths: excluded_paths.into(),
            store_timeout,
        }
    }

    /// `/docs/**` matches `/docs` and everything below it; other patterns match exactly.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|pattern| {
            match pattern.strip_suffix("/**") {
                Some(prefix) => {
                    path == prefix
                        || path
                            .strip_prefix(prefix)
                            .is_some_and(|rest| rest.starts_with('/'))
                }
                None => path == pattern,
            }
        })
    }
}
