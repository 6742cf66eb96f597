/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the admission resolved by the session middleware to handlers
 * - axum-specific plumbing lives in core
 */

mod core;

pub use self::core::AuthCtx;
