use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use crate::api::v1::dto::token::{RefreshRequest, TokenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// `POST /auth/refresh`: rotate the caller's session.
///
/// Excluded from the gate; the refresh token in the body is the credential.
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let Json(req) = body.map_err(|e| AppError::bad_request("INVALID_BODY", e.body_text()))?;
    if req.refresh_token.is_empty() {
        return Err(AppError::MissingToken);
    }

    let pair = state.tokens.refresh(&req.refresh_token).await?;
    Ok(Json(pair.into()))
}
