//! Authorization stage for store-manager routes.
//!
//! Runs after `access`, so the principal is already in the request extensions.
//! The embedded claims are never trusted for status: the account store is the authority.
//!
//! - 未認証 (principal なし) は pipeline の組み立てミス → IllegalArgument
//! - account 不明 / store 障害 / timeout → AccountStatus (fail-closed)
//! - status != PERMITTED → AccountStatus
//! - token の iat < last_logout_time → TokenRevoked

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
use crate::repos::account_repo::{AccountId, AccountRecord, AccountStatus};
use crate::services::auth::deadline::bounded;
use crate::state::AppState;

/// Guard every route of `router` (route_layer: unmatched paths still 404).
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, manager_middleware))
}

async fn manager_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_ctx = req
        .extensions()
        .get::<AuthCtx>()
        .cloned()
        .ok_or(AppError::IllegalArgument("manager check without principal"))?;
    let account = authorize_manager(&state, &auth_ctx).await?;

    debug!(account_id = %account.id, "manager authorized");
    // handler 側で再取得しなくて済むように account も渡す
    req.extensions_mut().insert(account);
    Ok(next.run(req).await)
}

/// Decide whether the principal may use a manager route.
pub async fn authorize_manager(
    state: &AppState,
    auth_ctx: &AuthCtx,
) -> Result<AccountRecord, AppError> {
    let account_id: AccountId = auth_ctx.subject().parse().map_err(|_| {
        debug!(sub = %auth_ctx.subject(), "subject is not an account id");
        AppError::TokenMalformed
    })?;

    let account = match bounded(state.gate.store_timeout, state.accounts.get_account(account_id))
        .await
    {
        Ok(Some(account)) => account,
        Ok(None) => {
            debug!(%account_id, "no manager account for subject");
            return Err(AppError::AccountStatus);
        }
        Err(err) => {
            warn!(%account_id, error = %err, "account lookup failed; denying");
            return Err(AppError::AccountStatus);
        }
    };

    if account.status != AccountStatus::Permitted {
        debug!(%account_id, status = account.status.as_str(), "manager not permitted");
        return Err(AppError::AccountStatus);
    }

    // Seconds granularity: `iat` carries no sub-second part.
    let predates_logout = account
        .last_logout_at
        .is_some_and(|at| auth_ctx.claims.iat < at.timestamp());
    if predates_logout {
        debug!(%account_id, iat = auth_ctx.claims.iat, "token predates last logout");
        return Err(AppError::TokenRevoked);
    }

    Ok(account)
}
