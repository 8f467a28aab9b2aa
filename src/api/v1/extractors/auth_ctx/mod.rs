/*
 * Responsibility
 * - 認証済み principal (AuthCtx) の型と extractor の公開窓口
 */
mod core;
mod types;

pub use self::core::AuthCtxExtractor;
pub use self::types::AuthCtx;
