use serde::Serialize;

use crate::services::authorizer::{Admission, AuthPath};

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub username: String,
    pub owner: bool,
    // "bearer" | "session"
    pub via: &'static str,
}

impl From<Admission> for AccountResponse {
    fn from(admission: Admission) -> Self {
        let via = match admission.via {
            AuthPath::Bearer => "bearer",
            AuthPath::Session => "session",
        };
        Self {
            id: admission.account.id,
            username: admission.account.username,
            owner: admission.account.owner,
            via,
        }
    }
}
