//! Server configuration loaded from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use closingdesk_infra::{ConfigError, EngineConfig};

pub const ENV_BIND_ADDR: &str = "CLOSINGDESK_BIND_ADDR";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiConfigError {
    #[error("invalid value for {key}: {value:?} (expected host:port)")]
    BindAddr { key: &'static str, value: String },

    #[error(transparent)]
    Engine(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub engine: EngineConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ApiConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup(ENV_BIND_ADDR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw.parse().map_err(|_| ApiConfigError::BindAddr {
            key: ENV_BIND_ADDR,
            value: raw.clone(),
        })?;

        Ok(Self {
            bind_addr,
            engine: EngineConfig::from_lookup(&lookup)?,
        })
    }
}
