/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /auth (refresh), /users (一般利用者), /stores (store manager) を nest
 * - manager 認可は /stores にだけ route_layer で適用する
 * - logout stage は logout route にだけ適用する (handler の後に動く)
 *
 * Notes
 * - access (認証) は app 側で router 全体に掛ける。除外 path は GatePolicy が決める
 */
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::api::v1::handlers::{stores, token, users};
use crate::middleware::auth::{logout, manager};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/refresh", post(token::refresh))
        .nest("/users", user_routes(state.clone()))
        .nest("/stores", store_routes(state))
}

fn user_routes(state: AppState) -> Router<AppState> {
    Router::new().route("/me", get(users::me)).route(
        "/logout",
        post(users::logout).route_layer(from_fn_with_state(state, logout::user_logout)),
    )
}

fn store_routes(state: AppState) -> Router<AppState> {
    let router = Router::new().route("/me", get(stores::me)).route(
        "/logout",
        post(stores::logout).route_layer(from_fn_with_state(state.clone(), logout::manager_logout)),
    );

    manager::apply(router, state)
}
