//! Session and authorization core of a multi-user server.
//!
//! Decides, per request, who the caller is (stateless bearer token or stateful
//! session) and whether they may mutate state. The session store and the
//! username -> sessions index are kept in agreement under concurrent access and
//! background expiry.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod model;
pub mod services;
pub mod state;
