use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error};
use uuid::Uuid;

use crate::services::auth::clock::Clock;

/// Claim names owned by the codec. Extra claims may not shadow them.
const RESERVED_CLAIMS: [&str; 6] = ["iss", "sub", "iat", "exp", "jti", "typ"];

/// Extra claims embedded at issuance (e.g. a role/status snapshot).
pub type ClaimMap = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token malformed")]
    Malformed,
    #[error("reserved claim cannot be overridden: {0}")]
    ReservedClaim(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Everything a token carries. Tokens are never mutated after issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub typ: TokenKind,
    #[serde(flatten)]
    pub extra: ClaimMap,
}

impl Claims {
    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Debug, Clone)]
pub struct TokenCodecConfig {
    pub issuer: String,
    pub access_ttl_seconds: u64,
    pub refresh_ttl_seconds: u64,
    pub leeway_seconds: u64,
}

/// HS256 token codec.
///
/// - Owns the signing key for the life of the process (built once from `Config`).
/// - Expiry is evaluated against the injected `Clock`: a token is expired when
///   `now >= exp + leeway`.
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenCodec {
    cfg: TokenCodecConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec").field("cfg", &self.cfg).finish()
    }
}

impl TokenCodec {
    pub fn new(
        secret: &[u8],
        cfg: TokenCodecConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Signing("empty signing key".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by `is_expired` against our own clock.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Ok(Self {
            cfg,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        })
    }

    pub fn access_ttl_seconds(&self) -> u64 {
        self.cfg.access_ttl_seconds
    }

    pub fn refresh_ttl_seconds(&self) -> u64 {
        self.cfg.refresh_ttl_seconds
    }

    /// Issue an access token for `account_id`, embedding `claims` next to the reserved ones.
    pub fn issue_access(&self, account_id: &str, claims: ClaimMap) -> Result<IssuedToken, TokenError> {
        if let Some(name) = claims.keys().find(|k| RESERVED_CLAIMS.contains(&k.as_str())) {
            return Err(TokenError::ReservedClaim(name.clone()));
        }
        self.issue(account_id, TokenKind::Access, self.cfg.access_ttl_seconds, claims)
    }

    pub fn issue_refresh(&self, account_id: &str) -> Result<IssuedToken, TokenError> {
        self.issue(
            account_id,
            TokenKind::Refresh,
            self.cfg.refresh_ttl_seconds,
            ClaimMap::new(),
        )
    }

    fn issue(
        &self,
        account_id: &str,
        typ: TokenKind,
        ttl_seconds: u64,
        extra: ClaimMap,
    ) -> Result<IssuedToken, TokenError> {
        let iat = self.clock.now().timestamp();
        let claims = Claims {
            iss: self.cfg.issuer.clone(),
            sub: account_id.to_string(),
            iat,
            exp: iat + ttl_seconds as i64,
            jti: Uuid::new_v4().to_string(),
            typ,
            extra,
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        let token = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            TokenError::Signing(e.to_string())
        })?;

        debug!(sub = %claims.sub, typ = ?typ, exp = claims.exp, "issued token");

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature and expiry.
    ///
    /// Expiry is decided on the unverified payload first, so a token past its
    /// expiry is `Expired` whether or not its signature is intact. Any other
    /// structural or signature problem is `Malformed`.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let unverified = self.extract_claims(token)?;
        if self.is_expired(&unverified) {
            return Err(TokenError::Expired);
        }

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "token verification failed");
                TokenError::Malformed
            })?;

        Ok(data.claims)
    }

    /// Decode claims without checking the signature or expiry.
    ///
    /// Only for inspecting a token that has already been validated (or whose
    /// contents are used for bookkeeping such as revocation TTLs).
    pub fn extract_claims(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::dangerous::insecure_decode::<Claims>(token)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Malformed)
    }

    pub fn is_expired(&self, claims: &Claims) -> bool {
        self.clock.now().timestamp() >= claims.exp.saturating_add(self.cfg.leeway_seconds as i64)
    }

    /// Time left until `validate` would stop accepting the token, at least one second.
    ///
    /// Includes the leeway, so a revocation entry never lapses while the token still verifies.
    pub fn remaining_ttl(&self, claims: &Claims) -> Duration {
        let accepted_until = claims.exp.saturating_add(self.cfg.leeway_seconds as i64);
        let secs = accepted_until - self.clock.now().timestamp();
        Duration::from_secs(secs.max(1) as u64)
    }
}
