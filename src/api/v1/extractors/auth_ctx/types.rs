/*
 * Responsibility
 * - Handler / 後段 stage から見える「認証済みコンテキスト」の型
 * - access middleware が検証して request extensions に格納し、以降はこの型だけを受け取る
 *
 * Notes
 * - 署名検証・失効確認は middleware/services 側の責務
 * - 中身は検証済み claims そのもの。権限判断に embedded claims を使うかは各 stage が決める
 */
use crate::services::auth::token_codec::Claims;

/// Principal installed by the authentication stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthCtx {
    pub claims: Claims,
}

impl AuthCtx {
    pub fn new(claims: Claims) -> Self {
        Self { claims }
    }

    /// Account identifier (`sub`).
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn jti(&self) -> &str {
        &self.claims.jti
    }
}
