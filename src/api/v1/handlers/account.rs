use axum::Json;

use crate::api::v1::{dto::account::AccountResponse, extractors::AuthCtx};

/// GET /account: who the caller is, and which path admitted them.
pub async fn get_account(AuthCtx(admission): AuthCtx) -> Json<AccountResponse> {
    Json(admission.into())
}
