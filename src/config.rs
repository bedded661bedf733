// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names and defaults for the demo service. The
//! library itself takes no global configuration; the middleware configs
//! (`TenantResolverConfig`, `AuthnConfig`, `AuthzConfig`) are built by the
//! caller.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DEFAULT_TENANT` | Tenant used when a request names none | None |
//! | `JWKS_URL_TEMPLATE` | Per-tenant JWKS endpoint, containing `{tid}` | Required |
//! | `JWKS_CACHE_TTL_SECS` | How long a tenant's key set is cached | `300` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::jwks::{DEFAULT_CACHE_TTL, TENANT_PLACEHOLDER};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Environment variable for the fallback tenant.
///
/// # Default
/// Unset: requests without `X-TID` header or `tid` query parameter are
/// rejected with 400.
pub const DEFAULT_TENANT_ENV: &str = "DEFAULT_TENANT";

/// Environment variable for the JWKS URL template.
///
/// `{tid}` is replaced with the tenant id of the token's `kid`, e.g.
/// `https://idp.example.com/tenants/{tid}/.well-known/jwks.json`.
pub const JWKS_URL_TEMPLATE_ENV: &str = "JWKS_URL_TEMPLATE";

pub const JWKS_CACHE_TTL_SECS_ENV: &str = "JWKS_CACHE_TTL_SECS";

/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value '{value}' for {var}")]
    Invalid { var: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::Invalid {
                var: LOG_FORMAT_ENV,
                value: s.to_string(),
            }),
        }
    }
}

/// Demo service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub default_tenant: Option<String>,
    pub jwks_url_template: String,
    pub jwks_cache_ttl: Duration,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    /// `Missing` if `JWKS_URL_TEMPLATE` is unset, `Invalid` for unparsable
    /// values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup. Empty values count as unset.
    ///
    /// # Errors
    /// See [`ServiceConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.is_empty());

        let jwks_url_template =
            get(JWKS_URL_TEMPLATE_ENV).ok_or(ConfigError::Missing(JWKS_URL_TEMPLATE_ENV))?;
        if !jwks_url_template.contains(TENANT_PLACEHOLDER) {
            return Err(ConfigError::Invalid {
                var: JWKS_URL_TEMPLATE_ENV,
                value: jwks_url_template,
            });
        }

        let port = match get(PORT_ENV) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: PORT_ENV,
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let jwks_cache_ttl = match get(JWKS_CACHE_TTL_SECS_ENV) {
            Some(value) => value
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    var: JWKS_CACHE_TTL_SECS_ENV,
                    value,
                })?,
            None => DEFAULT_CACHE_TTL,
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            default_tenant: get(DEFAULT_TENANT_ENV),
            jwks_url_template,
            jwks_cache_ttl,
            log_format,
        })
    }

    /// Socket address to bind.
    ///
    /// # Errors
    /// `Invalid` if `HOST` is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::Invalid {
                var: HOST_ENV,
                value: self.host.clone(),
            })
    }
}
