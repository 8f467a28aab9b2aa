/*
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("unknown account status: {0}")]
    UnknownStatus(String),
}

pub type RepoResult<T> = Result<T, RepoError>;
