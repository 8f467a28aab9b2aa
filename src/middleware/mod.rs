/*
 * Responsibility
 * - middleware の公開インターフェース (re-export)
 * - auth: gate の 3 stage (access / manager / logout)
 * - http: request id / trace / body limit / timeout
 */
pub mod auth;
pub mod bearer_auth;
pub mod http;
