//! Service configuration, read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present.
//!
//! | variable                 | default   |
//! |--------------------------|-----------|
//! | `UPSTREAM_URL`           | required  |
//! | `APP_HOST`               | `0.0.0.0` |
//! | `APP_PORT`               | `8000`    |
//! | `UPSTREAM_TIMEOUT_SECS`  | `20`      |
//! | `MAX_CONCURRENT_FETCHES` | `16`      |
//! | `CORS_ALLOWED_ORIGINS`   | any       |

use axum::http::HeaderValue;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("Missing environment variable: {key}")]
    Missing { key: String },

    /// A variable is set but its value cannot be used
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Runtime configuration of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the timetable service, without a trailing slash
    pub upstream_url: String,
    pub app_host: String,
    pub app_port: u16,
    /// Per-request timeout for timetable fetches
    pub upstream_timeout: Duration,
    /// Upper bound on timetable fetches in flight for one request
    pub max_concurrent_fetches: usize,
    /// Allowed CORS origins; empty allows any origin
    pub cors_allowed_origins: Vec<HeaderValue>,
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let upstream_url = parse_upstream_url(lookup("UPSTREAM_URL"))?;
        let app_host = lookup("APP_HOST")
            .filter(|host| !host.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let app_port = parse_or("APP_PORT", lookup("APP_PORT"), DEFAULT_PORT)?;
        let timeout_secs = parse_or(
            "UPSTREAM_TIMEOUT_SECS",
            lookup("UPSTREAM_TIMEOUT_SECS"),
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        )?;
        let max_concurrent_fetches = parse_or(
            "MAX_CONCURRENT_FETCHES",
            lookup("MAX_CONCURRENT_FETCHES"),
            DEFAULT_MAX_CONCURRENT_FETCHES,
        )?;

        if timeout_secs == 0 {
            return Err(invalid("UPSTREAM_TIMEOUT_SECS", "must be greater than zero"));
        }
        if max_concurrent_fetches == 0 {
            return Err(invalid("MAX_CONCURRENT_FETCHES", "must be greater than zero"));
        }

        let cors_allowed_origins = parse_origins(lookup("CORS_ALLOWED_ORIGINS"))?;

        Ok(Self {
            upstream_url,
            app_host,
            app_port,
            upstream_timeout: Duration::from_secs(timeout_secs),
            max_concurrent_fetches,
            cors_allowed_origins,
        })
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.into(),
    }
}

fn parse_upstream_url(raw: Option<String>) -> Result<String, ConfigError> {
    let raw = raw.ok_or_else(|| ConfigError::Missing {
        key: "UPSTREAM_URL".to_string(),
    })?;
    let trimmed = raw.trim().trim_end_matches('/');

    let url = Url::parse(trimmed).map_err(|e| invalid("UPSTREAM_URL", e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "UPSTREAM_URL",
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(trimmed.to_string())
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(key, e.to_string())),
        _ => Ok(default),
    }
}

fn parse_origins(raw: Option<String>) -> Result<Vec<HeaderValue>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| invalid("CORS_ALLOWED_ORIGINS", format!("{origin}: {e}")))
        })
        .collect()
}
