//! Identity verifier interface consumed by the request authorizer.
use async_trait::async_trait;
use thiserror::Error;

use crate::model::Account;

/// Verifier-side failures.
///
/// Note:
/// - Never shown to callers. The authorizer collapses every variant into a
///   single "expired session" rejection and only logs the detail.
#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("token verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
    #[error("identity backend unavailable: {0}")]
    Unavailable(String),
}

/// Resolves an opaque bearer credential into an [`Account`].
///
/// Cancellation follows the caller: the returned future is owned by the
/// request, so dropping the request (client gone, request timeout) aborts the
/// verification too.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + 'static {
    // Backend name for logs.
    fn backend_name(&self) -> &'static str;

    async fn validate(&self, token: &str) -> Result<Account, VerifierError>;
}
