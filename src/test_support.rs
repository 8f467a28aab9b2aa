//! Test doubles shared by unit and pipeline tests.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::repos::account_repo::{AccountId, AccountRecord, AccountStatus, AccountStore};
use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::clock::Clock;
use crate::services::auth::refresh::ValkeyRefreshTokenStore;
use crate::services::auth::revocation::{RevocationStore, ValkeyRevocationStore};
use crate::services::auth::token_codec::{TokenCodec, TokenCodecConfig};
use crate::services::auth::token_service::TokenService;
use crate::services::cache::CacheClient;
use crate::services::cache::client::{CacheError, CacheResult};
use crate::state::{AppState, GatePolicy};

pub const TEST_SECRET: &[u8] = b"test-signing-key";
pub const T0: i64 = 1_700_000_000;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at_epoch(secs: i64) -> Self {
        Self {
            now: Mutex::new(Utc.timestamp_opt(secs, 0).unwrap()),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// In-process stand-in for Valkey. TTLs are honoured on read.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, (String, Instant)>>>,
}

impl MemoryCache {
    fn live(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, deadline)) if *deadline > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(key)
            .map(|(_, deadline)| deadline.saturating_duration_since(Instant::now()))
    }
}

#[async_trait]
impl CacheClient for MemoryCache {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.live(key))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let ttl = ttl.max(Duration::from_secs(1));
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<bool> {
        if self.live(key).is_some() {
            return Ok(false);
        }
        self.set_with_ttl(key, value, ttl).await?;
        Ok(true)
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        Ok(self.entries.lock().unwrap().remove(key).map_or(0, |_| 1))
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> CacheResult<bool> {
        let mut entries = self.entries.lock().unwrap();
        let matches = entries
            .get(key)
            .is_some_and(|(value, deadline)| *deadline > Instant::now() && value == expected);
        if matches {
            entries.remove(key);
        }
        Ok(matches)
    }
}

/// `MemoryCache` that yields to the scheduler before every command, so
/// concurrent callers interleave the way they would against a network store.
#[derive(Clone, Debug, Default)]
pub struct YieldingCache(pub MemoryCache);

#[async_trait]
impl CacheClient for YieldingCache {
    fn backend_name(&self) -> &'static str {
        "yielding-memory"
    }

    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        tokio::task::yield_now().await;
        self.0.get_string(key).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        tokio::task::yield_now().await;
        self.0.set_with_ttl(key, value, ttl).await
    }

    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<bool> {
        tokio::task::yield_now().await;
        self.0.set_if_absent_with_ttl(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> CacheResult<u64> {
        tokio::task::yield_now().await;
        self.0.del(key).await
    }

    async fn delete_if_equals(&self, key: &str, expected: &str) -> CacheResult<bool> {
        tokio::task::yield_now().await;
        self.0.delete_if_equals(key, expected).await
    }
}

/// Cache whose every command fails, as if the backend were unreachable.
#[derive(Clone, Debug, Default)]
pub struct BrokenCache;

#[async_trait]
impl CacheClient for BrokenCache {
    fn backend_name(&self) -> &'static str {
        "broken"
    }

    async fn get_string(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::BackendConnection("connection refused".into()))
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::BackendConnection("connection refused".into()))
    }

    async fn set_if_absent_with_ttl(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Duration,
    ) -> CacheResult<bool> {
        Err(CacheError::BackendConnection("connection refused".into()))
    }

    async fn del(&self, _key: &str) -> CacheResult<u64> {
        Err(CacheError::BackendConnection("connection refused".into()))
    }

    async fn delete_if_equals(&self, _key: &str, _expected: &str) -> CacheResult<bool> {
        Err(CacheError::BackendConnection("connection refused".into()))
    }
}

/// Revocation store that never answers within any reasonable deadline.
#[derive(Debug, Default)]
pub struct StalledRevocations;

#[async_trait]
impl RevocationStore for StalledRevocations {
    async fn is_revoked(&self, _token_id: &str) -> CacheResult<bool> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(false)
    }

    async fn revoke(&self, _token_id: &str, _ttl: Duration) -> CacheResult<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

/// Revocation store that answers reads but rejects every write.
#[derive(Debug, Default)]
pub struct ReadOnlyRevocations;

#[async_trait]
impl RevocationStore for ReadOnlyRevocations {
    async fn is_revoked(&self, _token_id: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn revoke(&self, _token_id: &str, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::BackendCommand("READONLY".into()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<HashMap<AccountId, AccountRecord>>,
    fail: bool,
}

impl MemoryAccountStore {
    pub fn failing() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    pub fn insert(&self, id: i64, status: AccountStatus, last_logout_at: Option<DateTime<Utc>>) {
        let id = AccountId(id);
        self.accounts.lock().unwrap().insert(
            id,
            AccountRecord {
                id,
                status,
                last_logout_at,
            },
        );
    }

    pub fn last_logout_at(&self, id: i64) -> Option<DateTime<Utc>> {
        self.accounts
            .lock()
            .unwrap()
            .get(&AccountId(id))
            .and_then(|a| a.last_logout_at)
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get_account(&self, id: AccountId) -> RepoResult<Option<AccountRecord>> {
        if self.fail {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(self.accounts.lock().unwrap().get(&id).cloned())
    }

    async fn set_last_logout_at(&self, id: AccountId, at: DateTime<Utc>) -> RepoResult<()> {
        if self.fail {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        if let Some(account) = self.accounts.lock().unwrap().get_mut(&id) {
            account.last_logout_at = Some(at);
        }
        Ok(())
    }
}

/// Fully wired state over in-memory collaborators.
pub struct Harness {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub cache: MemoryCache,
    pub accounts: Arc<MemoryAccountStore>,
}

pub fn codec(clock: Arc<ManualClock>) -> TokenCodec {
    TokenCodec::new(
        TEST_SECRET,
        TokenCodecConfig {
            issuer: "flower-auth".to_string(),
            access_ttl_seconds: 900,
            refresh_ttl_seconds: 14 * 24 * 3600,
            leeway_seconds: 0,
        },
        clock,
    )
    .unwrap()
}

pub fn gate_policy() -> GatePolicy {
    GatePolicy::new(
        vec![
            "/health".to_string(),
            "/docs/**".to_string(),
            "/api/v1/auth/refresh".to_string(),
        ],
        Duration::from_millis(200),
    )
}

pub fn harness() -> Harness {
    harness_with(None, Arc::new(MemoryAccountStore::default()))
}

pub fn harness_with(
    revocations: Option<Arc<dyn RevocationStore>>,
    accounts: Arc<MemoryAccountStore>,
) -> Harness {
    let clock = Arc::new(ManualClock::at_epoch(T0));
    let cache = MemoryCache::default();
    let codec = Arc::new(codec(clock.clone()));

    let revocations = revocations.unwrap_or_else(|| {
        Arc::new(ValkeyRevocationStore::new_with_cache(
            Arc::new(cache.clone()),
            "auth:revoked",
        ))
    });
    let refresh_tokens = Arc::new(ValkeyRefreshTokenStore::new_with_cache(
        Arc::new(cache.clone()),
        "auth:refresh",
    ));
    let tokens = Arc::new(TokenService::new(
        codec.clone(),
        refresh_tokens.clone(),
        Duration::from_millis(200),
    ));

    let state = AppState {
        codec,
        tokens,
        revocations,
        refresh_tokens,
        accounts: accounts.clone(),
        gate: gate_policy(),
        clock: clock.clone(),
    };

    Harness {
        state,
        clock,
        cache,
        accounts,
    }
}
