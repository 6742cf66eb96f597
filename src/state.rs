/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 *   - session registry, request authorizer
 * - Cheap to clone (everything behind Arc)
 */
use std::sync::Arc;

use crate::services::{authorizer::RequestAuthorizer, session::SessionRegistry};

#[derive(Clone, Debug)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
    pub authorizer: Arc<RequestAuthorizer>,
    // Mark the session cookie `Secure` (production only).
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        sessions: Arc<SessionRegistry>,
        authorizer: Arc<RequestAuthorizer>,
        secure_cookies: bool,
    ) -> Self {
        Self {
            sessions,
            authorizer,
            secure_cookies,
        }
    }
}
