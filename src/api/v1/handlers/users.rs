/*
 * Responsibility
 * - /users 系 handler (一般利用者)
 * - principal は AuthCtxExtractor で受け取るだけ。検証は middleware 済み
 * - logout の実処理 (revoke 等) は logout stage が handler の後に行う
 */
use axum::Json;

use crate::api::v1::dto::principal::{LogoutResponse, PrincipalResponse};
use crate::api::v1::extractors::auth_ctx::AuthCtxExtractor;

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<PrincipalResponse> {
    Json(ctx.into())
}

pub async fn logout(AuthCtxExtractor(_ctx): AuthCtxExtractor) -> Json<LogoutResponse> {
    Json(LogoutResponse { logged_out: true })
}
