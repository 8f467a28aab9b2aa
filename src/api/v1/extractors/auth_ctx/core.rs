/*
 * 主な責務
 *  - request extensions から AuthCtx を取り出す FromRequestParts 実装
 *  - 見つからない場合は IllegalArgument (= gate の組み立てミス) として 500 を返す
 * 置かないもの
 *  - token の検証ロジック (middleware::auth::access)
 */
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::error;

use super::types::AuthCtx;
use crate::error::AppError;

/// Handler-side access to the principal.
///
/// A route reached without the authentication stage has no principal; that is a
/// wiring bug, not a client error.
#[derive(Debug, Clone)]
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .cloned()
            .map(AuthCtxExtractor)
            .ok_or_else(|| {
                error!(path = %parts.uri.path(), "no principal on request; is the access layer applied?");
                AppError::IllegalArgument("no authenticated principal")
            })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;
    use crate::services::auth::token_codec::ClaimMap;
    use crate::test_support::harness;

    #[tokio::test]
    async fn picks_up_the_installed_principal() {
        let h = harness();
        let claims = h.state.codec.issue_access("5", ClaimMap::new()).unwrap().claims;

        let mut req = Request::builder().uri("/x").body(()).unwrap();
        req.extensions_mut().insert(AuthCtx::new(claims.clone()));
        let (mut parts, _) = req.into_parts();

        let AuthCtxExtractor(ctx) = AuthCtxExtractor::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(ctx.claims, claims);
    }

    #[tokio::test]
    async fn missing_principal_is_an_illegal_argument() {
        let (mut parts, _) = Request::builder().uri("/x").body(()).unwrap().into_parts();

        let res = AuthCtxExtractor::from_request_parts(&mut parts, &()).await;
        assert!(matches!(res, Err(AppError::IllegalArgument(_))));
    }
}
