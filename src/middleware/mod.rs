/*
 * Responsibility
 * - Public entry points of the middleware layer
 * - apply(...) functions called from app.rs / routes.rs
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
