// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into a [`ServerConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the redb database | `./data` |
//! | `JWT_SECRET` | HMAC secret used to sign credentials | Required (dev builds fall back) |
//! | `TOKEN_TTL_SECS` | Credential lifetime in seconds | `86400` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use crate::auth::CredentialConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the credential signing secret.
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";

pub const TOKEN_TTL_ENV: &str = "TOKEN_TTL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Secret used by `dev` builds when `JWT_SECRET` is unset.
#[cfg(feature = "dev")]
const DEV_JWT_SECRET: &str = "vending-machine-dev-secret";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Read `LOG_FORMAT` on its own, so logging can start before the rest
    /// of the configuration is loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|name: &str| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => Ok(LogFormat::Pretty),
            Some("json") => Ok(LogFormat::Json),
            Some(other) => Err(ConfigError::Invalid {
                name: LOG_FORMAT_ENV,
                value: other.to_string(),
            }),
        }
    }
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub credentials: CredentialConfig,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?;
        let data_dir = lookup(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let ttl_secs = parse_or(&lookup, TOKEN_TTL_ENV, DEFAULT_TOKEN_TTL_SECS)?;
        if ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: TOKEN_TTL_ENV,
                value: ttl_secs.to_string(),
            });
        }

        let log_format = LogFormat::from_lookup(&lookup)?;

        Ok(Self {
            host,
            port,
            data_dir,
            credentials: CredentialConfig {
                secret: jwt_secret(&lookup)?,
                ttl_secs,
            },
            log_format,
        })
    }

    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn jwt_secret<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(JWT_SECRET_ENV).filter(|s| !s.is_empty()) {
        Some(secret) => Ok(secret),
        #[cfg(feature = "dev")]
        None => {
            tracing::warn!("{JWT_SECRET_ENV} not set, using the development secret");
            Ok(DEV_JWT_SECRET.to_string())
        }
        #[cfg(not(feature = "dev"))]
        None => Err(ConfigError::Missing {
            name: JWT_SECRET_ENV,
        }),
    }
}
