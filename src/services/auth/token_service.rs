use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::AppError;
use crate::services::auth::deadline::bounded;
use crate::services::auth::refresh::RefreshTokenStore;
use crate::services::auth::token_codec::{ClaimMap, TokenCodec, TokenKind};

/// Service that orchestrates access-token issuance and refresh-token sessions.
///
/// - TokenCodec signs and verifies both kinds of token.
/// - RefreshTokenStore keeps exactly one live refresh token per account.
#[derive(Clone)]
pub struct TokenService {
    codec: Arc<TokenCodec>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    store_timeout: Duration,
}

impl TokenService {
    pub fn new(
        codec: Arc<TokenCodec>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            codec,
            refresh_tokens,
            store_timeout,
        }
    }

    /// Issue a new token pair for an authenticated account.
    ///
    /// The refresh token overwrites whatever session the account had before.
    pub async fn issue_session(
        &self,
        account_id: &str,
        claims: ClaimMap,
    ) -> Result<IssuedTokenPair, AppError> {
        let access = self.codec.issue_access(account_id, claims)?;
        let refresh = self.codec.issue_refresh(account_id)?;

        let ttl = Duration::from_secs(self.codec.refresh_ttl_seconds());
        bounded(
            self.store_timeout,
            self.refresh_tokens.put(account_id, &refresh.token, ttl),
        )
        .await
        .map_err(|e| {
            warn!(account_id, error = %e, "failed to store refresh token");
            AppError::Internal
        })?;

        debug!(account_id, jti = %access.claims.jti, "issued token pair");

        Ok(IssuedTokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "Bearer",
            expires_in: self.codec.access_ttl_seconds(),
        })
    }

    /// Exchange a refresh token for a fresh pair (rotation).
    ///
    /// - the token must verify, be a refresh token, and be the account's current session
    /// - the new access token carries identity only; authorization never trusts embedded claims
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokenPair, AppError> {
        let claims = self.codec.validate(refresh_token)?;
        if claims.typ != TokenKind::Refresh {
            debug!(sub = %claims.sub, "access token presented as refresh token");
            return Err(AppError::TokenMalformed);
        }

        // Redeem and drop the session in one step; a concurrent refresh with the same token loses.
        let redeemed = bounded(
            self.store_timeout,
            self.refresh_tokens.take_if_matches(&claims.sub, refresh_token),
        )
        .await
        .map_err(|e| {
            warn!(sub = %claims.sub, error = %e, "refresh session redemption failed");
            AppError::Internal
        })?;

        if !redeemed {
            debug!(sub = %claims.sub, "refresh token superseded, logged out or already used");
            return Err(AppError::TokenRevoked);
        }

        self.issue_session(&claims.sub, ClaimMap::new()).await
    }
}

/// Service-level return type to keep handlers thin.
#[derive(Clone, Debug)]
pub struct IssuedTokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}
