// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::Algorithm;
use serde::Serialize;
use utoipa::ToSchema;

use super::claims::ClaimsError;
use super::keys::KeyResolveError;

/// Every way the tenant, authentication and authorization stages can refuse
/// a request.
///
/// Token and claim failures surface as 401, tenant resolution and binding
/// failures as 400, and a denied permission as 403.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token at the configured source, or the scheme prefix is wrong
    #[error("missing or malformed access token")]
    MissingToken,
    /// Token header could not be decoded
    #[error("token is malformed")]
    MalformedToken,
    /// Token was signed with a different algorithm than configured
    #[error("unexpected token signing algorithm {found:?} (expected {expected:?})")]
    UnsupportedAlgorithm {
        expected: Algorithm,
        found: Algorithm,
    },
    /// Token header has no `kid`
    #[error("token header has no key id")]
    MissingKeyId,
    /// `kid` is not `<tenant>/<key>`
    #[error("invalid key id '{0}' (expected '<tenant>/<key>')")]
    InvalidKeyId(String),
    /// The key resolver could not produce a key
    #[error("signing key not found: {0}")]
    KeyNotFound(#[source] KeyResolveError),
    /// Signature does not verify against the resolved key
    #[error("token signature is invalid")]
    InvalidSignature,
    /// Payload is undecodable or fails claim validation
    #[error("token claims are invalid: {0}")]
    InvalidClaims(String),
    /// No tenant id from header, query or default
    #[error("missing tenant id")]
    MissingTenant,
    /// Token tenant differs from the request tenant
    #[error("requesting tid:{request_tenant}, but token_tid:{token_tenant}")]
    TenantMismatch {
        request_tenant: String,
        token_tenant: String,
    },
    /// Caller lacks the required permission
    #[error("unauthorized, needs perm of {required}")]
    PermissionDenied { required: String },
    /// No permission set was committed for this request
    #[error("unauthorized, needs perm of {required}")]
    MissingPermissionContext { required: String },
}

/// JSON body of an error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthErrorBody {
    /// Human-readable message
    pub error: String,
    /// Stable machine-readable code
    pub error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnsupportedAlgorithm { .. } => "unsupported_algorithm",
            AuthError::MissingKeyId => "missing_key_id",
            AuthError::InvalidKeyId(_) => "invalid_key_id",
            AuthError::KeyNotFound(_) => "key_not_found",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::MissingTenant => "missing_tenant",
            AuthError::TenantMismatch { .. } => "tenant_mismatch",
            AuthError::PermissionDenied { .. } => "permission_denied",
            AuthError::MissingPermissionContext { .. } => "missing_permission_context",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::UnsupportedAlgorithm { .. }
            | AuthError::MissingKeyId
            | AuthError::InvalidKeyId(_)
            | AuthError::KeyNotFound(_)
            | AuthError::InvalidSignature
            | AuthError::InvalidClaims(_)
            | AuthError::MissingPermissionContext { .. } => StatusCode::UNAUTHORIZED,
            AuthError::MissingTenant | AuthError::TenantMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            AuthError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        }
    }

    /// Build the JSON body without consuming the error.
    pub fn body(&self) -> AuthErrorBody {
        AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        }
    }
}

impl From<ClaimsError> for AuthError {
    fn from(err: ClaimsError) -> Self {
        AuthError::InvalidClaims(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
