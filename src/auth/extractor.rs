// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token extraction and Axum extractors for authenticated requests.
//!
//! Handlers behind the authentication middleware can take the verified
//! claims and the resolved tenant directly:
//!
//! ```rust,ignore
//! async fn list_users(Principal(claims): Principal, Tenant(tid): Tenant) -> impl IntoResponse {
//!     // claims.subject, claims.permissions, ...
//! }
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderName, Uri},
};

use super::{AuthError, Claims};
use crate::context::TenantContext;

/// Default authorization scheme.
pub const DEFAULT_AUTH_SCHEME: &str = "Bearer";

/// Where the raw token is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// `<name>: <scheme> <token>`
    Header { name: HeaderName, scheme: String },
    /// `?<name>=<token>`
    Query { name: String },
}

impl Default for TokenSource {
    fn default() -> Self {
        Self::Header {
            name: AUTHORIZATION,
            scheme: DEFAULT_AUTH_SCHEME.to_string(),
        }
    }
}

impl TokenSource {
    pub fn header(name: HeaderName, scheme: impl Into<String>) -> Self {
        Self::Header {
            name,
            scheme: scheme.into(),
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::Query { name: name.into() }
    }

    /// Read the raw token.
    ///
    /// # Errors
    /// `MissingToken` if the header or parameter is absent or empty, or the
    /// header does not start with `<scheme> `.
    pub fn extract(&self, headers: &HeaderMap, uri: &Uri) -> Result<String, AuthError> {
        match self {
            Self::Header { name, scheme } => {
                let value = headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .ok_or(AuthError::MissingToken)?;

                value
                    .strip_prefix(scheme.as_str())
                    .and_then(|rest| rest.strip_prefix(' '))
                    .filter(|token| !token.is_empty())
                    .map(str::to_string)
                    .ok_or(AuthError::MissingToken)
            }
            Self::Query { name } => {
                let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri)
                    .map_err(|_| AuthError::MissingToken)?;

                params
                    .get(name)
                    .filter(|token| !token.is_empty())
                    .cloned()
                    .ok_or(AuthError::MissingToken)
            }
        }
    }
}

/// Errors parsing a `<source>:<name>` token lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenSourceError {
    #[error("token lookup '{0}' must have the form '<header|query>:<name>'")]
    InvalidFormat(String),
    #[error("unknown token source '{0}'")]
    UnknownSource(String),
    #[error("invalid header name '{0}'")]
    InvalidHeader(String),
}

impl FromStr for TokenSource {
    type Err = TokenSourceError;

    /// Parse `header:<name>` or `query:<name>`. Header sources use the
    /// default scheme.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, name) = s
            .split_once(':')
            .filter(|(_, name)| !name.is_empty())
            .ok_or_else(|| TokenSourceError::InvalidFormat(s.to_string()))?;

        match source {
            "header" => {
                let name = HeaderName::from_str(name)
                    .map_err(|_| TokenSourceError::InvalidHeader(name.to_string()))?;
                Ok(Self::header(name, DEFAULT_AUTH_SCHEME))
            }
            "query" => Ok(Self::query(name)),
            other => Err(TokenSourceError::UnknownSource(other.to_string())),
        }
    }
}

/// Extractor for the verified claims of the current request.
///
/// Requires the authentication middleware to have run.
pub struct Principal(pub Claims);

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Principal)
            .ok_or(AuthError::MissingToken)
    }
}

/// Extractor for the resolved tenant id.
///
/// Requires the tenant resolver middleware to have run.
pub struct Tenant(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Tenant {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .map(|ctx| Tenant(ctx.tenant_id().to_string()))
            .ok_or(AuthError::MissingTenant)
    }
}
