//! Credential carriers read off the HTTP request.
//!
//! Values are copied out of the request so the authorizer future does not
//! borrow the request (its body is not `Sync`).
use axum::http::{HeaderMap, Method, Request, header};

use crate::services::authorizer::AccessRequest;

pub const SESSION_HEADER: &str = "x-session-id";
pub const SESSION_COOKIE: &str = "session-id";

#[derive(Debug, Clone)]
pub struct Carriers {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub session_header: Option<String>,
    pub session_cookie: Option<String>,
}

impl Carriers {
    pub fn from_request<B>(req: &Request<B>, path: &str) -> Self {
        let headers = req.headers();
        Self {
            method: req.method().clone(),
            path: path.to_string(),
            authorization: authorization(headers).map(str::to_string),
            session_header: header_str(headers, SESSION_HEADER).map(str::to_string),
            session_cookie: cookie_value(headers, SESSION_COOKIE).map(str::to_string),
        }
    }

    pub fn as_access(&self) -> AccessRequest<'_> {
        AccessRequest {
            method: Some(&self.method),
            path: &self.path,
            authorization: self.authorization.as_deref(),
            session_header: self.session_header.as_deref(),
            session_cookie: self.session_cookie.as_deref(),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `Authorization` value whenever the header is present at all.
///
/// A value that is blank or not visible ASCII comes back as `""`, so it still
/// selects the bearer path and fails there instead of looking absent.
pub fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().map(str::trim).unwrap_or_default())
}

/// Session id from the `X-Session-Id` header, else from the `session-id` cookie.
pub fn session_id(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, SESSION_HEADER).or_else(|| cookie_value(headers, SESSION_COOKIE))
}

/// First non-empty value of cookie `name` across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.trim_matches('"'))
}
