use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::authorizer::{Admission, Rejection};
use crate::state::AppState;

/// Extractor for the caller's `Admission`.
/// Expects the session middleware to have inserted it into request extensions;
/// a route outside the middleware gets "no session".
pub struct AuthCtx(pub Admission);

impl FromRequestParts<AppState> for AuthCtx
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Admission>()
            .cloned()
            .map(AuthCtx)
            .ok_or(AppError::Rejected(Rejection::NoSession))
    }
}
