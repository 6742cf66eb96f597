/*
 * Responsibility
 * - Session request/response DTOs
 */
use serde::Serialize;

use crate::model::Account;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: String,
    pub expires_in: u64,
    pub account: Account,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub current: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub username: String,
    pub sessions: Vec<SessionSummary>,
}
