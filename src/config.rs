/*
 * Responsibility
 * - Load settings from the environment (.env is honoured via dotenvy)
 * - Validate them up front (missing/invalid values fail startup)
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::services::authorizer::BearerPolicy;

// 400 days, the longest cookie lifetime browsers honour.
const MAX_SESSION_TTL_SECONDS: u64 = 400 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // Bearer path
    pub jwt_secret: String,
    pub access_token_leeway_seconds: u64,
    pub verifier_timeout: Duration,
    pub bearer_policy: BearerPolicy,

    // Session path
    pub session_ttl: Duration,
    pub session_sweep_interval: Duration,

    pub request_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the JWT secret
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("access_token_leeway_seconds", &self.access_token_leeway_seconds)
            .field("verifier_timeout", &self.verifier_timeout)
            .field("bearer_policy", &self.bearer_policy)
            .field("session_ttl", &self.session_ttl)
            .field("session_sweep_interval", &self.session_sweep_interval)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_or(&var, "PORT", 3000)?;
        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let jwt_secret = var("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let access_token_leeway_seconds = parse_or(&var, "ACCESS_TOKEN_LEEWAY_SECONDS", 60)?;

        let verifier_timeout =
            Duration::from_millis(positive_or(&var, "VERIFIER_TIMEOUT_MS", 5_000)?);

        let bearer_policy = if parse_or(&var, "BEARER_SCHEME_STRICT", true)? {
            BearerPolicy::Strict
        } else {
            BearerPolicy::Tolerant
        };

        // 30 days, same as the login cookie lifetime
        let session_ttl = Duration::from_secs(bounded_or(
            &var,
            "SESSION_TTL_SECONDS",
            2_592_000,
            MAX_SESSION_TTL_SECONDS,
        )?);
        let session_sweep_interval =
            Duration::from_secs(positive_or(&var, "SESSION_SWEEP_INTERVAL_SECONDS", 60)?);

        let request_timeout =
            Duration::from_secs(positive_or(&var, "REQUEST_TIMEOUT_SECONDS", 30)?);

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            access_token_leeway_seconds,
            verifier_timeout,
            bearer_policy,
            session_ttl,
            session_sweep_interval,
            request_timeout,
        })
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match var(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid(key))
        }
        _ => Ok(default),
    }
}

fn positive_or(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match parse_or(var, key, default)? {
        0 => Err(ConfigError::Invalid(key)),
        n => Ok(n),
    }
}

fn bounded_or(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    match positive_or(var, key, default)? {
        n if n > max => Err(ConfigError::Invalid(key)),
        n => Ok(n),
    }
}
