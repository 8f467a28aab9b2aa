/*
 * Responsibility
 * - /stores 系 handler (store manager)
 * - manager stage が積んだ AccountRecord を Extension で受け取る
 */
use axum::{Extension, Json};

use crate::api::v1::dto::principal::{LogoutResponse, ManagerResponse};
use crate::api::v1::extractors::auth_ctx::AuthCtxExtractor;
use crate::repos::account_repo::AccountRecord;

pub async fn me(
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Extension(account): Extension<AccountRecord>,
) -> Json<ManagerResponse> {
    Json(ManagerResponse {
        principal: ctx.into(),
        status: account.status.as_str(),
        last_logout_at: account.last_logout_at,
    })
}

pub async fn logout(AuthCtxExtractor(_ctx): AuthCtxExtractor) -> Json<LogoutResponse> {
    Json(LogoutResponse { logged_out: true })
}
