/*
 * Responsibility
 * - tracing / panic hook setup
 * - Config -> dependencies (registry, verifier, authorizer) -> Router
 * - Sweeper lifecycle + axum::serve with graceful shutdown
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::{Router, routing::get};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::Config;
use crate::middleware;
use crate::services::{
    authorizer::RequestAuthorizer,
    clock::{Clock, SystemClock},
    identity::{IdentityVerifier, JwtIdentityVerifier},
    session::{SessionRegistry, sweeper},
};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g.
    // RUST_LOG=info,session_gate=debug,audit=info cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Surface panics through tracing; stderr may not be collected.
        tracing::error!(?info, "panic");

        // Development: crash the whole process so it gets noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting session gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    tracing::debug!(?config, "configuration loaded");

    let state = build_state(&config);

    let shutdown = CancellationToken::new();
    let sweeper = sweeper::spawn(
        state.sessions.clone(),
        config.session_sweep_interval,
        shutdown.clone(),
    );

    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // Covers serve returning for reasons other than the signal.
    shutdown.cancel();
    sweeper.await?;
    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(err) = res {
                tracing::error!(error = %err, "failed to listen for ctrl-c");
            }
            tracing::info!("shutdown requested");
            shutdown.cancel();
        }
        _ = shutdown.cancelled() => {}
    }
}

fn build_state(config: &Config) -> AppState {
    build_state_with_clock(config, Arc::new(SystemClock))
}

// Process-level services are built here and injected via AppState; nothing is global.
fn build_state_with_clock(config: &Config, clock: Arc<dyn Clock>) -> AppState {
    let sessions = Arc::new(SessionRegistry::new(clock, config.session_ttl));

    let verifier: Arc<dyn IdentityVerifier> = Arc::new(JwtIdentityVerifier::new(
        &config.jwt_secret,
        config.access_token_leeway_seconds,
    ));

    let authorizer = Arc::new(RequestAuthorizer::new(
        verifier,
        sessions.clone(),
        config.bearer_policy,
        config.verifier_timeout,
    ));

    AppState::new(sessions, authorizer, config.app_env.is_production())
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config.request_timeout)
}
