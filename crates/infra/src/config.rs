//! Engine configuration loaded from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const ENV_LOCK_TIMEOUT_MS: &str = "CLOSINGDESK_LOCK_TIMEOUT_MS";
pub const ENV_CONTENTION_RETRIES: &str = "CLOSINGDESK_CONTENTION_RETRIES";
pub const ENV_RETRY_BACKOFF_MS: &str = "CLOSINGDESK_RETRY_BACKOFF_MS";
pub const ENV_JOURNAL_PATH: &str = "CLOSINGDESK_JOURNAL_PATH";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on waiting for a deal or account lock.
    pub lock_timeout: Duration,
    /// Automatic retries on `Contention` before surfacing it.
    pub contention_retries: u32,
    /// Base delay between retries (multiplied by the attempt number).
    pub retry_backoff: Duration,
    /// Durable journal location; `None` keeps state in memory only.
    pub journal_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(2000),
            contention_retries: 3,
            retry_backoff: Duration::from_millis(10),
            journal_path: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let lock_timeout = match lookup(ENV_LOCK_TIMEOUT_MS) {
            Some(raw) => Duration::from_millis(parse_number(ENV_LOCK_TIMEOUT_MS, &raw)?),
            None => defaults.lock_timeout,
        };
        let contention_retries = match lookup(ENV_CONTENTION_RETRIES) {
            Some(raw) => parse_number(ENV_CONTENTION_RETRIES, &raw)?,
            None => defaults.contention_retries,
        };
        let retry_backoff = match lookup(ENV_RETRY_BACKOFF_MS) {
            Some(raw) => Duration::from_millis(parse_number(ENV_RETRY_BACKOFF_MS, &raw)?),
            None => defaults.retry_backoff,
        };
        let journal_path = lookup(ENV_JOURNAL_PATH)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        if lock_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: ENV_LOCK_TIMEOUT_MS,
                value: "0".to_string(),
                reason: "lock timeout must be positive".to_string(),
            });
        }

        Ok(Self {
            lock_timeout,
            contention_retries,
            retry_backoff,
            journal_path,
        })
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
