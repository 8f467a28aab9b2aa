//! Logout stage.
//!
//! Wraps the logout handlers and acts only once the handler has answered 2xx.
//! Every step is best-effort: the client already has its success response, so
//! failures are logged and never turn into an error response.
//!
//! - revoke the presented access token for its remaining lifetime
//! - drop the account's refresh-token session
//! - manager logout only: stamp `last_logout_time` so every older token dies too

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::api::v1::extractors::auth_ctx::AuthCtx;
use crate::error::AppError;
use crate::middleware::bearer_auth::bearer_token;
use crate::repos::account_repo::AccountId;
use crate::services::auth::deadline::bounded;
use crate::services::auth::revocation::token_fingerprint;
use crate::state::AppState;

pub async fn user_logout(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    run_logout(state, req, next, false).await
}

pub async fn manager_logout(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    run_logout(state, req, next, true).await
}

async fn run_logout(
    state: AppState,
    req: Request<Body>,
    next: Next,
    stamp_account: bool,
) -> Result<Response, AppError> {
    let auth_ctx = req
        .extensions()
        .get::<AuthCtx>()
        .cloned()
        .ok_or(AppError::IllegalArgument("logout without principal"))?;
    let token = bearer_token(req.headers())?.to_owned();

    let res = next.run(req).await;

    if res.status().is_success() {
        finish_logout(&state, &token, &auth_ctx, stamp_account).await;
    }

    Ok(res)
}

/// Post-handler logout effects. Never fails.
pub async fn finish_logout(state: &AppState, token: &str, auth_ctx: &AuthCtx, stamp_account: bool) {
    let limit = state.gate.store_timeout;
    let sub = auth_ctx.subject();

    let token_id = token_fingerprint(token);
    let ttl = state.codec.remaining_ttl(&auth_ctx.claims);
    if let Err(err) = bounded(limit, state.revocations.revoke(&token_id, ttl)).await {
        warn!(sub, error = %err, "failed to revoke token on logout");
    }

    if let Err(err) = bounded(limit, state.refresh_tokens.invalidate(sub)).await {
        warn!(sub, error = %err, "failed to invalidate refresh token on logout");
    }

    if stamp_account {
        match sub.parse::<AccountId>() {
            Ok(account_id) => {
                let now = state.clock.now();
                if let Err(err) =
                    bounded(limit, state.accounts.set_last_logout_at(account_id, now)).await
                {
                    warn!(%account_id, error = %err, "failed to record logout time");
                }
            }
            Err(_) => warn!(sub, "subject is not an account id; logout time not recorded"),
        }
    }

    info!(sub, jti = auth_ctx.jti(), manager = stamp_account, "logged out");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::repos::account_repo::AccountStatus;
    use crate::services::auth::revocation::ValkeyRevocationStore;
    use crate::services::auth::token_codec::ClaimMap;
    use crate::test_support::{BrokenCache, MemoryAccountStore, T0, harness, harness_with};

    #[tokio::test]
    async fn revokes_for_the_remaining_lifetime_and_drops_the_session() {
        let h = harness();
        let pair = h.state.tokens.issue_session("7", ClaimMap::new()).await.unwrap();
        let claims = h.state.codec.validate(&pair.access_token).unwrap();
        h.clock.advance_secs(300);

        finish_logout(&h.state, &pair.access_token, &AuthCtx::new(claims), false).await;

        let key = format!("auth:revoked:{}", token_fingerprint(&pair.access_token));
        let ttl = h.cache.ttl_of(&key).unwrap();
        assert!(ttl <= Duration::from_secs(600) && ttl > Duration::from_secs(590));
        assert!(h.state.refresh_tokens.get("7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn manager_logout_stamps_the_account() {
        let h = harness();
        h.accounts.insert(7, AccountStatus::Permitted, None);
        let issued = h.state.codec.issue_access("7", ClaimMap::new()).unwrap();
        h.clock.advance_secs(5);

        finish_logout(&h.state, &issued.token, &AuthCtx::new(issued.claims), true).await;

        let stamped = h.accounts.last_logout_at(7).unwrap();
        assert_eq!(stamped.timestamp(), T0 + 5);
    }

    #[tokio::test]
    async fn user_logout_leaves_the_account_alone() {
        let h = harness();
        h.accounts.insert(7, AccountStatus::Permitted, None);
        let issued = h.state.codec.issue_access("7", ClaimMap::new()).unwrap();

        finish_logout(&h.state, &issued.token, &AuthCtx::new(issued.claims), false).await;

        assert!(h.accounts.last_logout_at(7).is_none());
    }

    #[tokio::test]
    async fn store_failures_are_swallowed() {
        let broken = Arc::new(ValkeyRevocationStore::new_with_cache(
            Arc::new(BrokenCache),
            "auth:revoked",
        ));
        let h = harness_with(Some(broken), Arc::new(MemoryAccountStore::failing()));
        let issued = h.state.codec.issue_access("7", ClaimMap::new()).unwrap();

        // completes without panicking or erroring
        finish_logout(&h.state, &issued.token, &AuthCtx::new(issued.claims), true).await;
    }
}
