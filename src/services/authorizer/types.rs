use axum::http::Method;
use thiserror::Error;

use crate::model::Account;

/// Credential carriers and request shape as seen by the authorizer.
///
/// An `authorization` of `Some` selects the bearer path even when blank.
/// Empty session carriers are treated like absent values.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessRequest<'a> {
    pub method: Option<&'a Method>,
    pub path: &'a str,
    pub authorization: Option<&'a str>,
    pub session_header: Option<&'a str>,
    pub session_cookie: Option<&'a str>,
}

/// Caller-facing admission failures. Each is scoped to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no session")]
    NoSession,
    // Also used for malformed or unverifiable bearer credentials.
    #[error("expired session")]
    ExpiredSession,
    #[error("insufficient account level")]
    InsufficientLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPath {
    Bearer,
    Session,
}

/// A successful admission. Inserted into request extensions by the middleware.
#[derive(Debug, Clone)]
pub struct Admission {
    pub account: Account,
    pub via: AuthPath,
    /// Set on the session path only.
    pub session_id: Option<String>,
}

/// How strictly the `Authorization` header's scheme is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerPolicy {
    /// Exactly `<scheme> <token>` where scheme is `Bearer` (any case).
    Strict,
    /// Any scheme is accepted as long as a token part follows it.
    Tolerant,
}
