/*
 * Responsibility
 * - Bearer トークンのヘッダ抽出 (`Authorization: Bearer <token>`)
 * - ヘッダ欠落 / prefix 不正は client error (MissingToken) として扱う
 * - 検証 (署名・期限・失効) は access / manager 側の責務
 */
use axum::http::{HeaderMap, header};

use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingToken)?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(AppError::MissingToken)?;

    if token.is_empty() {
        return Err(AppError::MissingToken);
    }
    Ok(token)
}
