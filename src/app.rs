/*
 * Responsibility
 * - Config読み込み → 依存生成 (Postgres / Valkey / codec) → Router 組み立て
 * - Middleware の適用 (gate + HTTP 共通 layer)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware::{auth::access, http};
use crate::repos::account_repo::PgAccountRepo;
use crate::services::auth::refresh::ValkeyRefreshTokenStore;
use crate::services::auth::revocation::ValkeyRevocationStore;
use crate::services::auth::token_codec::TokenCodecConfig;
use crate::services::auth::{Clock, SystemClock, TokenCodec, TokenService};
use crate::services::cache::ValkeyClient;
use crate::state::{AppState, GatePolicy};

const DB_MAX_CONNECTIONS: u32 = 10;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,flower_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost".
        tracing::error!(?info, "panic");

        // development: fail fast / production: keep serving
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(?config, "starting gate in {:?} mode on {}", config.app_env, config.addr);

    let state = build_state(&config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let pool = PgPoolOptions::new()
        .max_connections(DB_MAX_CONNECTIONS)
        .acquire_timeout(config.store_timeout)
        .connect(&config.database_url)
        .await
        .context("failed to connect to postgres")?;

    let valkey = ValkeyClient::new(&config.redis_url)
        .await
        .context("failed to connect to valkey")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let codec = Arc::new(TokenCodec::new(
        config.jwt_secret.as_bytes(),
        TokenCodecConfig {
            issuer: config.auth_issuer.clone(),
            access_ttl_seconds: config.access_token_ttl_seconds,
            refresh_ttl_seconds: config.refresh_token_ttl_seconds,
            leeway_seconds: config.token_leeway_seconds,
        },
        clock.clone(),
    )?);

    let refresh_tokens = Arc::new(ValkeyRefreshTokenStore::new(valkey.clone()));
    let tokens = Arc::new(TokenService::new(
        codec.clone(),
        refresh_tokens.clone(),
        config.store_timeout,
    ));

    Ok(AppState {
        codec,
        tokens,
        revocations: Arc::new(ValkeyRevocationStore::new(valkey)),
        refresh_tokens,
        accounts: Arc::new(PgAccountRepo::new(pool)),
        gate: GatePolicy::new(config.gate_excluded_paths.clone(), config.store_timeout),
        clock,
    })
}

/// Full application: routes, the access gate over all of them, then the HTTP layers.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()));

    let router = access::apply(router, state.clone()).with_state(state);

    http::apply(router)
}
