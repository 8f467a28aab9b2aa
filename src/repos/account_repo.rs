/*
 * Responsibility
 * - store manager アカウントの status / last_logout_time の読み取り
 * - logout 時の last_logout_time 更新 (status は書き換えない)
 *
 * Schema assumed:
 * - store_manager_auth.id               (bigint, pk)
 * - store_manager_auth.status           (text: ROLE_STORE_MANAGER_{PENDING,PERMITTED,DENIED})
 * - store_manager_auth.last_logout_time (timestamptz, nullable)
 */
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub i64);

impl FromStr for AccountId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>().map(AccountId)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Approval state, owned by the account-management side.
///
/// `Pending -> Permitted` and `Pending -> Denied` happen elsewhere; this crate only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Pending,
    Permitted,
    Denied,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "ROLE_STORE_MANAGER_PENDING",
            AccountStatus::Permitted => "ROLE_STORE_MANAGER_PERMITTED",
            AccountStatus::Denied => "ROLE_STORE_MANAGER_DENIED",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_STORE_MANAGER_PENDING" => Ok(AccountStatus::Pending),
            "ROLE_STORE_MANAGER_PERMITTED" => Ok(AccountStatus::Permitted),
            "ROLE_STORE_MANAGER_DENIED" => Ok(AccountStatus::Denied),
            other => Err(RepoError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub id: AccountId,
    pub status: AccountStatus,
    pub last_logout_at: Option<DateTime<Utc>>,
}

/// What the gate needs from the account store.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_account(&self, id: AccountId) -> RepoResult<Option<AccountRecord>>;

    // Unknown ids are a no-op.
    async fn set_last_logout_at(&self, id: AccountId, at: DateTime<Utc>) -> RepoResult<()>;
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: i64,
    status: String,
    last_logout_time: Option<DateTime<Utc>>,
}

impl TryFrom<AccountRow> for AccountRecord {
    type Error = RepoError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(AccountRecord {
            id: AccountId(row.id),
            status: row.status.parse()?,
            last_logout_at: row.last_logout_time,
        })
    }
}

#[derive(Clone, Debug)]
pub struct PgAccountRepo {
    pool: PgPool,
}

impl PgAccountRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountRepo {
    async fn get_account(&self, id: AccountId) -> RepoResult<Option<AccountRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, status, last_logout_time
            FROM store_manager_auth
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccountRecord::try_from).transpose()
    }

    async fn set_last_logout_at(&self, id: AccountId, at: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query(
            r#"
            UPDATE store_manager_auth
            SET last_logout_time = $2
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
