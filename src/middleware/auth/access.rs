//! Authentication stage: access token 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <jwt>` を取り出す (無ければ MissingToken)
//! - revocation store で失効済みかを確認 (store 障害・timeout は fail-closed で TokenRevoked)
//! - TokenCodec で署名 / 期限を検証 (TokenExpired / TokenMalformed はそのまま返す)
//! - 成功時は AuthCtx を request extensions に格納するだけ (共有状態は変更しない)

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, warn};

use crate::api::v1::extractors::auth_ctx::AuthCtx;
use crate::error::AppError;
use crate::middleware::bearer_auth::bearer_token;
use crate::services::auth::deadline::bounded;
use crate::services::auth::revocation::token_fingerprint;
use crate::services::auth::token_codec::TokenKind;
use crate::state::AppState;

/// Gate every route of `router` except the configured exclusions.
///
/// ```ignore
/// let app = middleware::auth::access::apply(app, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if state.gate.is_excluded(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let token = bearer_token(req.headers())?;
    let auth_ctx = authenticate(&state, token).await?;

    // middleware → extractor / later stages への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}

/// Resolve a raw bearer token into the request principal.
pub async fn authenticate(state: &AppState, token: &str) -> Result<AuthCtx, AppError> {
    let token_id = token_fingerprint(token);

    match bounded(state.gate.store_timeout, state.revocations.is_revoked(&token_id)).await {
        Ok(false) => {}
        Ok(true) => {
            debug!(token_id = %token_id, "revoked token presented");
            return Err(AppError::TokenRevoked);
        }
        Err(err) => {
            // fail closed
            warn!(error = %err, "revocation lookup failed; rejecting token");
            return Err(AppError::TokenRevoked);
        }
    }

    let claims = state.codec.validate(token).map_err(|err| {
        debug!(error = %err, "access token verification failed");
        AppError::from(err)
    })?;

    if claims.typ != TokenKind::Access {
        debug!(sub = %claims.sub, "non-access token presented as bearer");
        return Err(AppError::TokenMalformed);
    }

    Ok(AuthCtx::new(claims))
}
