/*!
 * Request admission
 *
 * Responsibility:
 * - Resolve exactly one Account per request (bearer path or session path)
 * - Enforce the role policy (mutations are owner-only)
 *
 * Transport concerns (reading headers/cookies, status codes) stay in the
 * middleware; this module only sees the raw credential carriers.
 */

mod core;
mod types;

pub use self::core::{RequestAuthorizer, is_mutating, parse_bearer};
pub use types::{AccessRequest, Admission, AuthPath, BearerPolicy, Rejection};
