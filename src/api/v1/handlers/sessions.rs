/*
 * Responsibility
 * - login: bearer token -> server-issued session (+ cookie)
 * - logout: drop the caller's own session
 * - list / revoke the caller's sessions (behind the session middleware)
 */
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    api::v1::{
        dto::sessions::{LoginResponse, SessionListResponse, SessionSummary},
        extractors::AuthCtx,
    },
    error::AppError,
    middleware::auth::carriers::{self, SESSION_COOKIE},
    services::authorizer::Rejection,
    state::AppState,
};

/// POST /login
///
/// The bearer token is verified exactly like on the bearer path; the session
/// is then registered in the user index before it becomes visible in the store.
pub async fn login(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let authorization = carriers::authorization(&headers).ok_or(Rejection::NoSession)?;

    let account = state.authorizer.resolve_bearer(authorization).await?;

    let session_id = state.sessions.create(account.clone());
    let expires_in = state.sessions.session_ttl().as_secs();
    tracing::info!(username = %account.username, "session issued");

    let cookie = session_cookie(&session_id, expires_in, state.secure_cookies);
    let body = LoginResponse {
        session_id,
        expires_in,
        account,
    };

    Ok((StatusCode::CREATED, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /logout
///
/// Idempotent: an unknown or already expired session still clears the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let session_id = carriers::session_id(&headers).ok_or(Rejection::NoSession)?;

    let removed = state.sessions.invalidate(session_id);
    tracing::debug!(removed, "logout");

    let cookie = session_cookie("", 0, state.secure_cookies);
    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
}

/// GET /sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    AuthCtx(admission): AuthCtx,
) -> Json<SessionListResponse> {
    let current = admission.session_id.as_deref();
    let sessions = state
        .sessions
        .sessions_of(&admission.account.username)
        .into_iter()
        .map(|id| SessionSummary {
            current: Some(id.as_str()) == current,
            id,
        })
        .collect();

    Json(SessionListResponse {
        username: admission.account.username,
        sessions,
    })
}

/// DELETE /sessions
///
/// Revokes every session of the caller, the current one included.
pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    AuthCtx(admission): AuthCtx,
) -> StatusCode {
    state
        .sessions
        .invalidate_user(&admission.account.username);

    StatusCode::NO_CONTENT
}

/// DELETE /sessions/{session_id}
///
/// Only sessions bound to the caller's username can be revoked.
pub async fn revoke_session(
    State(state): State<AppState>,
    AuthCtx(admission): AuthCtx,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let username = &admission.account.username;
    if !state.sessions.invalidate_owned(&session_id, username) {
        return Err(AppError::not_found("session"));
    }

    tracing::info!(username = %username, "session revoked");

    Ok(StatusCode::NO_CONTENT)
}

fn session_cookie(value: &str, max_age: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
