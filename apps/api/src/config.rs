use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis_client::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub analysis_service_url: String,
    pub port: u16,
    pub rust_log: String,
    pub retry_max_attempts: u32,
    pub retry_max_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            analysis_service_url: require_env("ANALYSIS_SERVICE_URL")?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            retry_max_attempts: env_or("RETRY_MAX_ATTEMPTS", 3)?,
            retry_max_seconds: env_or("RETRY_MAX_SECONDS", 30)?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts.max(1),
            max_elapsed: Duration::from_secs(self.retry_max_seconds),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_or(key, std::env::var(key).ok(), default)
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_uses_default_when_unset() {
        assert_eq!(parse_or::<u16>("PORT", None, 8080).unwrap(), 8080);
    }

    #[test]
    fn test_parse_or_parses_value() {
        assert_eq!(parse_or::<u32>("RETRY_MAX_ATTEMPTS", Some(" 5 ".into()), 3).unwrap(), 5);
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        let err = parse_or::<u16>("PORT", Some("eighty".into()), 8080).unwrap_err();
        assert!(err.to_string().contains("PORT must be a valid u16"));
    }

    #[test]
    fn test_retry_policy_never_drops_below_one_attempt() {
        let config = Config {
            analysis_service_url: "http://localhost:8001".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            retry_max_attempts: 0,
            retry_max_seconds: 10,
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.max_elapsed, Duration::from_secs(10));
    }
}
