use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::v1::extractors::auth_ctx::AuthCtx;
use crate::services::auth::token_codec::ClaimMap;

/// What `/me` reports about the caller, straight from the verified token.
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalResponse {
    pub sub: String,
    pub jti: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub claims: ClaimMap,
}

impl From<AuthCtx> for PrincipalResponse {
    fn from(ctx: AuthCtx) -> Self {
        let issued_at = ctx.claims.issued_at();
        let expires_at = ctx.claims.expires_at();
        Self {
            sub: ctx.claims.sub,
            jti: ctx.claims.jti,
            issued_at,
            expires_at,
            claims: ctx.claims.extra,
        }
    }
}

/// `/stores/me`: the principal plus the account row the gate just checked.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerResponse {
    #[serde(flatten)]
    pub principal: PrincipalResponse,
    pub status: &'static str,
    pub last_logout_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}
