/*
 * Responsibility
 * - Identity record shared by the session path and the bearer path
 * - Immutable once bound to a session (clone, never mutate in place)
 */
use serde::{Deserialize, Serialize};

/// Resolved caller identity.
///
/// - `owner` is the elevated role; only owners may perform mutating requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub owner: bool,
}

impl Account {
    pub fn new(id: i64, username: impl Into<String>, owner: bool) -> Self {
        Self {
            id,
            username: username.into(),
            owner,
        }
    }
}
