/*
 * Responsibility
 * - アプリ共通の AppError 定義 (gate の拒否理由を含む)
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - TokenError を gate の拒否理由へ変換 (store 系エラーは各 stage が fail-closed で判断)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::token_codec::TokenError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// No usable `Authorization: Bearer <token>` header. A client error, not an auth failure.
    #[error("missing bearer token")]
    MissingToken,
    #[error("token is malformed")]
    TokenMalformed,
    #[error("token has expired")]
    TokenExpired,
    #[error("token has been revoked")]
    TokenRevoked,
    #[error("account is not permitted")]
    AccountStatus,
    /// A stage ran without its prerequisite. Signals a misconfigured pipeline.
    #[error("illegal argument: {0}")]
    IllegalArgument(&'static str),
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingToken | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::TokenMalformed | AppError::TokenExpired | AppError::TokenRevoked => {
                StatusCode::UNAUTHORIZED
            }
            AppError::AccountStatus => StatusCode::FORBIDDEN,
            AppError::IllegalArgument(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingToken => "MISSING_TOKEN",
            AppError::TokenMalformed => "TOKEN_MALFORMED",
            AppError::TokenExpired => "TOKEN_EXPIRED",
            AppError::TokenRevoked => "TOKEN_REVOKED",
            AppError::AccountStatus => "ACCOUNT_STATUS",
            AppError::IllegalArgument(_) => "ILLEGAL_ARGUMENT",
            AppError::BadRequest { code, .. } => *code,
            AppError::Internal => "INTERNAL",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            AppError::BadRequest { message, .. } => message,
            // Pipeline details stay in the logs.
            AppError::IllegalArgument(_) => "internal server error".into(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AppError::TokenExpired,
            TokenError::Malformed => AppError::TokenMalformed,
            // Issuance-side failures are server problems.
            TokenError::ReservedClaim(_) | TokenError::Signing(_) => AppError::Internal,
        }
    }
}
