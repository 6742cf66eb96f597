use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;

use crate::model::Account;
use crate::services::identity::IdentityVerifier;
use crate::services::session::SessionRegistry;

use super::{AccessRequest, Admission, AuthPath, BearerPolicy, Rejection};

const BEARER_SCHEME: &str = "Bearer";

/// Per-request admission control.
///
/// The bearer path and the session path are mutually exclusive: once an
/// `Authorization` header is present, the session carriers are never looked at.
#[derive(Clone)]
pub struct RequestAuthorizer {
    verifier: Arc<dyn IdentityVerifier>,
    sessions: Arc<SessionRegistry>,
    bearer_policy: BearerPolicy,
    verifier_timeout: Duration,
}

impl std::fmt::Debug for RequestAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthorizer")
            .field("verifier", &self.verifier.backend_name())
            .field("bearer_policy", &self.bearer_policy)
            .field("verifier_timeout", &self.verifier_timeout)
            .finish()
    }
}

impl RequestAuthorizer {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        sessions: Arc<SessionRegistry>,
        bearer_policy: BearerPolicy,
        verifier_timeout: Duration,
    ) -> Self {
        Self {
            verifier,
            sessions,
            bearer_policy,
            verifier_timeout,
        }
    }

    pub async fn authorize(&self, req: &AccessRequest<'_>) -> Result<Admission, Rejection> {
        match req.authorization {
            Some(authorization) => self.authorize_bearer(authorization, req).await,
            None => self.authorize_session(req),
        }
    }

    /// Turn an `Authorization` header value into an `Account`, without any
    /// role check. Every failure is the same generic `ExpiredSession`.
    pub async fn resolve_bearer(&self, authorization: &str) -> Result<Account, Rejection> {
        let Some(token) = parse_bearer(authorization, self.bearer_policy) else {
            tracing::debug!("malformed authorization header");
            return Err(Rejection::ExpiredSession);
        };

        match tokio::time::timeout(self.verifier_timeout, self.verifier.validate(token)).await {
            Ok(Ok(account)) => Ok(account),
            Ok(Err(err)) => {
                tracing::warn!(
                    error = %err,
                    backend = self.verifier.backend_name(),
                    "bearer token verification failed"
                );
                Err(Rejection::ExpiredSession)
            }
            Err(_) => {
                tracing::warn!(
                    backend = self.verifier.backend_name(),
                    timeout_ms = self.verifier_timeout.as_millis() as u64,
                    "bearer token verification timed out"
                );
                Err(Rejection::ExpiredSession)
            }
        }
    }

    async fn authorize_bearer(
        &self,
        authorization: &str,
        req: &AccessRequest<'_>,
    ) -> Result<Admission, Rejection> {
        let account = self.resolve_bearer(authorization).await?;

        let mutating = is_mutating(req.method);
        if mutating && !account.owner {
            return Err(Rejection::InsufficientLevel);
        }

        let method = req.method.map(Method::as_str).unwrap_or_default();
        if mutating {
            tracing::info!(
                target: "audit",
                username = %account.username,
                method,
                path = req.path,
                "bearer token access granted"
            );
        } else {
            tracing::debug!(username = %account.username, method, path = req.path, "bearer read access");
        }

        Ok(Admission {
            account,
            via: AuthPath::Bearer,
            session_id: None,
        })
    }

    fn authorize_session(&self, req: &AccessRequest<'_>) -> Result<Admission, Rejection> {
        let session_id = non_empty(req.session_header)
            .or_else(|| non_empty(req.session_cookie))
            .ok_or(Rejection::NoSession)?;

        let account = self
            .sessions
            .lookup(session_id)
            .ok_or(Rejection::ExpiredSession)?;

        if is_mutating(req.method) && !account.owner {
            return Err(Rejection::InsufficientLevel);
        }

        Ok(Admission {
            account,
            via: AuthPath::Session,
            session_id: Some(session_id.to_string()),
        })
    }
}

/// Extract the token from an `Authorization` value.
pub fn parse_bearer(value: &str, policy: BearerPolicy) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;

    match policy {
        BearerPolicy::Strict => {
            let token = token.trim();
            let well_formed = scheme.eq_ignore_ascii_case(BEARER_SCHEME)
                && !token.is_empty()
                && !token.contains(' ');
            well_formed.then_some(token)
        }
        // The whole remainder goes to the verifier, which rejects what it cannot read.
        BearerPolicy::Tolerant => Some(token),
    }
}

/// An absent method is a read. A present one mutates unless it is safe.
pub fn is_mutating(method: Option<&Method>) -> bool {
    method.is_some_and(|m| !m.is_safe())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
