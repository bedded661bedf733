// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and their validation.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use utoipa::ToSchema;

use crate::authz::PermissionSet;

/// Claims carried by a tenant-scoped ID token.
///
/// Every member is optional on the wire so that a missing mandatory claim is
/// reported by [`ClaimsValidator`] instead of failing deserialization.
/// Empty members are skipped when serializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// Tenant the token was issued for
    #[serde(rename = "tid", default, skip_serializing_if = "String::is_empty")]
    pub tenant_id: String,

    /// Subject (user ID)
    #[serde(rename = "sub", default, skip_serializing_if = "String::is_empty")]
    pub subject: String,

    /// Issuer
    #[serde(rename = "iss", default, skip_serializing_if = "String::is_empty")]
    pub issuer: String,

    /// Issued at (seconds since epoch)
    #[serde(rename = "iat", default, skip_serializing_if = "is_zero")]
    pub issued_at: i64,

    /// Expiration (seconds since epoch)
    #[serde(rename = "exp", default, skip_serializing_if = "is_zero")]
    pub expires_at: i64,

    /// Not before (seconds since epoch)
    #[serde(rename = "nbf", default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<i64>,

    #[serde(
        rename = "preferred_username",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub username: String,

    /// Granted permissions, `<service>.<resource>.<action>`
    #[serde(rename = "perms", default, skip_serializing_if = "PermissionSet::is_empty")]
    pub permissions: PermissionSet,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub email_verified: bool,

    #[serde(rename = "phone_number", default, skip_serializing_if = "String::is_empty")]
    pub phone: String,

    #[serde(
        rename = "phone_number_verified",
        default,
        skip_serializing_if = "is_false"
    )]
    pub phone_verified: bool,

    /// Authorized party
    #[serde(rename = "azp", default, skip_serializing_if = "String::is_empty")]
    pub authorized_party: String,

    /// Access token hash
    #[serde(rename = "at_hash", default, skip_serializing_if = "String::is_empty")]
    pub access_token_hash: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Claims {
    /// Check `access_token` against the `at_hash` claim.
    ///
    /// # Errors
    /// Fails if the claim is absent, the algorithm has no OIDC hash, or the
    /// hashes differ.
    pub fn verify_access_token_hash(
        &self,
        algorithm: Algorithm,
        access_token: &str,
    ) -> Result<(), ClaimsError> {
        if self.access_token_hash.is_empty() {
            return Err(ClaimsError::MissingAccessTokenHash);
        }

        if access_token_hash(algorithm, access_token)? != self.access_token_hash {
            return Err(ClaimsError::AccessTokenHashMismatch);
        }

        Ok(())
    }
}

/// Claim validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimsError {
    #[error("token is missing mandatory claims: {}", .0.join(", "))]
    MissingMandatory(Vec<&'static str>),
    #[error("token has expired")]
    Expired,
    #[error("token used before issued")]
    IssuedInFuture,
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("token has no at_hash claim")]
    MissingAccessTokenHash,
    #[error("at_hash does not match the access token")]
    AccessTokenHashMismatch,
    #[error("no at_hash digest is defined for {0:?}")]
    UnsupportedHashAlgorithm(Algorithm),
}

/// Mandatory-claim and temporal checks.
///
/// There is no clock skew allowance: `iat <= now < exp`, and `nbf <= now`
/// when `nbf` is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsValidator;

impl ClaimsValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate against the current time.
    ///
    /// # Errors
    /// See [`ClaimsValidator::validate_at`].
    pub fn validate(&self, claims: &Claims) -> Result<(), ClaimsError> {
        self.validate_at(claims, Utc::now().timestamp())
    }

    /// Validate against `now` (seconds since epoch).
    ///
    /// # Errors
    /// `MissingMandatory` if any of `tid`, `sub`, `iss`, `iat`, `exp` is
    /// empty or zero, otherwise the first failing temporal check.
    pub fn validate_at(&self, claims: &Claims, now: i64) -> Result<(), ClaimsError> {
        let missing: Vec<&'static str> = [
            ("tid", claims.tenant_id.is_empty()),
            ("sub", claims.subject.is_empty()),
            ("iss", claims.issuer.is_empty()),
            ("iat", claims.issued_at == 0),
            ("exp", claims.expires_at == 0),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(ClaimsError::MissingMandatory(missing));
        }

        if now >= claims.expires_at {
            return Err(ClaimsError::Expired);
        }
        if now < claims.issued_at {
            return Err(ClaimsError::IssuedInFuture);
        }
        if claims.not_before.is_some_and(|nbf| now < nbf) {
            return Err(ClaimsError::NotYetValid);
        }

        Ok(())
    }
}

/// Compute the OIDC `at_hash` of an access token.
///
/// The digest is chosen by the signing algorithm; the left half is encoded
/// base64url without padding.
///
/// # Errors
/// `UnsupportedHashAlgorithm` for HMAC and EdDSA algorithms.
pub fn access_token_hash(algorithm: Algorithm, access_token: &str) -> Result<String, ClaimsError> {
    let digest = match algorithm {
        Algorithm::RS256 | Algorithm::PS256 | Algorithm::ES256 => {
            Sha256::digest(access_token.as_bytes()).to_vec()
        }
        Algorithm::RS384 | Algorithm::PS384 | Algorithm::ES384 => {
            Sha384::digest(access_token.as_bytes()).to_vec()
        }
        Algorithm::RS512 | Algorithm::PS512 => Sha512::digest(access_token.as_bytes()).to_vec(),
        other => return Err(ClaimsError::UnsupportedHashAlgorithm(other)),
    };

    Ok(Base64UrlUnpadded::encode_string(&digest[..digest.len() / 2]))
}
