/*
 * Responsibility
 * - v1 URL layout
 * - Decides which routes sit behind the session middleware
 *   (login/logout authenticate on their own and are left outside)
 */
use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{
    account::get_account,
    health::health,
    sessions::{list_sessions, login, logout, revoke_all_sessions, revoke_session},
};

pub fn routes(state: AppState) -> Router<AppState> {
    let guarded = Router::new()
        .route("/account", get(get_account))
        .route("/sessions", get(list_sessions).delete(revoke_all_sessions))
        .route("/sessions/{session_id}", delete(revoke_session));
    let guarded = middleware::auth::session::apply(guarded, state);

    Router::new()
        .route("/health", get(health))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .merge(guarded)
}
