//! Environment-driven configuration.
//!
//! | variable | default |
//! |---|---|
//! | `WBS_PLANNER_PORT` | 8000 |
//! | `WBS_PLANNER_AI_URL` | unset (AI routes answer 503) |
//! | `WBS_PLANNER_AI_KEY` | unset |
//! | `WBS_PLANNER_AI_TIMEOUT_MS` | 30000 |
//! | `WBS_PLANNER_AI_MAX_RETRIES` | 2 |
//! | `WBS_PLANNER_AI_RETRY_DELAY_MS` | 500 |
//!
//! Authentication, CORS and rate limiting are read by
//! [`SecurityConfig::from_env`](crate::api::SecurityConfig::from_env).

use std::env;
use std::str::FromStr;

use crate::api::SecurityConfig;

pub const DEFAULT_PORT: u16 = 8000;

/// Connection settings for the AI backend.
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl AiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_ms: 30_000,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }

    /// `None` when `WBS_PLANNER_AI_URL` is unset or blank.
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("WBS_PLANNER_AI_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())?;

        let defaults = Self::new(base_url);
        Some(Self {
            api_key: env::var("WBS_PLANNER_AI_KEY").ok(),
            timeout_ms: parse_var("WBS_PLANNER_AI_TIMEOUT_MS", defaults.timeout_ms),
            max_retries: parse_var("WBS_PLANNER_AI_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: parse_var("WBS_PLANNER_AI_RETRY_DELAY_MS", defaults.retry_delay_ms),
            ..defaults
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub ai: Option<AiConfig>,
    pub security: SecurityConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("WBS_PLANNER_PORT", DEFAULT_PORT),
            ai: AiConfig::from_env(),
            security: SecurityConfig::from_env(),
        }
    }
}

/// Parse an environment variable, falling back to `default` when it is
/// unset or malformed.
fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "Ignoring malformed value, using {}", default);
            default
        }),
        Err(_) => default,
    }
}
