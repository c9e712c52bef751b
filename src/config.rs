//! Startup configuration, read from the environment.

use std::{env, fmt::Display, net::SocketAddr, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::ConfigError;

/// Google Books volumes endpoint.
pub const DEFAULT_BOOKS_API_URL: &str = "https://www.googleapis.com/books/v1/volumes";
/// Gemini `generateContent` endpoint.
pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Runtime configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: Option<String>,
    pub bind_addr: SocketAddr,
    pub books_api_url: String,
    pub gemini_api_url: String,
    /// Applied to outbound HTTP calls. `None` leaves them unbounded.
    pub http_timeout: Option<Duration>,
    /// Inactivity period after which a session lapses. Always positive.
    pub session_expiry: time::Duration,
    pub secure_cookies: bool,
    pub max_connections: u32,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads every setting through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let gemini_api_key = var("GEMINI_API_KEY");
        if gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY not set, book summaries are disabled");
        }

        let http_timeout = match var("HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse("HTTP_TIMEOUT_SECS", &raw)?)),
            None => None,
        };

        let session_hours: u32 = try_load(&var, "SESSION_EXPIRY_HOURS", "24")?;
        if session_hours == 0 {
            return Err(ConfigError::Invalid {
                key: "SESSION_EXPIRY_HOURS",
                value: session_hours.to_string(),
                reason: "must be at least one hour".into(),
            });
        }

        Ok(Self {
            database_url,
            gemini_api_key,
            bind_addr: try_load(&var, "BIND_ADDR", "127.0.0.1:3000")?,
            books_api_url: var("BOOKS_API_URL").unwrap_or_else(|| DEFAULT_BOOKS_API_URL.into()),
            gemini_api_url: var("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_GEMINI_API_URL.into()),
            http_timeout,
            session_expiry: time::Duration::hours(i64::from(session_hours)),
            secure_cookies: try_load(&var, "SECURE_COOKIES", "false")?,
            max_connections: try_load(&var, "DB_MAX_CONNECTIONS", "10")?,
        })
    }
}

fn try_load<T, V>(var: &V, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    V: Fn(&str) -> Option<String>,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    parse(key, &raw)
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
