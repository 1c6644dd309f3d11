use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:3000,http://localhost:5173,http://127.0.0.1:3000,http://127.0.0.1:5173";

/// Application configuration loaded from environment variables.
/// Optional backends fall back to in-process defaults when their variables are unset.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Anthropic key. `None` selects the scripted interviewer.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub ai_request_timeout: Duration,
    pub max_user_messages: usize,
    pub shutdown_timeout: Duration,
    /// Empty means permissive CORS.
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Split out so tests do not touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            database_url: non_empty("DATABASE_URL"),
            anthropic_api_key: non_empty("ANTHROPIC_API_KEY"),
            port: parse_or("PORT", non_empty("PORT"), 8080u16)?,
            rust_log: non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            ai_request_timeout: Duration::from_secs(parse_or(
                "AI_REQUEST_TIMEOUT_SECS",
                non_empty("AI_REQUEST_TIMEOUT_SECS"),
                60u64,
            )?),
            max_user_messages: parse_or(
                "INTERVIEW_MAX_USER_MESSAGES",
                non_empty("INTERVIEW_MAX_USER_MESSAGES"),
                8usize,
            )?,
            shutdown_timeout: Duration::from_secs(parse_or(
                "SHUTDOWN_TIMEOUT_SECS",
                non_empty("SHUTDOWN_TIMEOUT_SECS"),
                10u64,
            )?),
            cors_allowed_origins: parse_origins(
                &non_empty("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into()),
            ),
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    if raw.trim() == "*" {
        return Vec::new();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
