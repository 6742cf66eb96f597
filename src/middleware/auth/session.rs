//! Admission middleware: bearer token or session -> Admission in extensions.
//!
//! Every route under this layer sees either a resolved `Admission` (with the
//! caller's `Account`) or never runs; rejections become `AppError` responses.

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::middleware::auth::carriers::Carriers;
use crate::state::AppState;

/// Guard every route of `router` with the request authorizer.
///
/// ```ignore
/// let guarded = middleware::auth::session::apply(guarded, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8: from_fn cannot take a State extractor, hence from_fn_with_state
    router.layer(middleware::from_fn_with_state(state, session_middleware))
}

async fn session_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let carriers = Carriers::from_request(&req, original_uri.path());

    let admission = match state.authorizer.authorize(&carriers.as_access()).await {
        Ok(admission) => admission,
        Err(rejection) => {
            tracing::debug!(
                method = %carriers.method,
                path = %carriers.path,
                reason = %rejection,
                "request rejected"
            );
            return Err(rejection.into());
        }
    };

    // middleware -> extractor hand-off
    req.extensions_mut().insert(admission);

    Ok(next.run(req).await)
}
