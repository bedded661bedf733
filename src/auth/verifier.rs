// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! ## Verification steps
//!
//! 1. Decode the token header without trusting the payload
//! 2. Require the configured signing algorithm (RS256 by default)
//! 3. Require a `kid` of the form `<tenant id>/<key id>`
//! 4. Resolve the key through the [`KeyResolver`]
//! 5. Verify the signature
//! 6. Decode the claims and run the [`ClaimsValidator`]
//! 7. Require the `tid` claim to name the tenant of the signing key
//!
//! Each step has its own [`AuthError`] variant. Nothing is retried.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

use super::claims::{Claims, ClaimsValidator};
use super::error::AuthError;
use super::keys::KeyResolver;

/// Signing algorithm expected when none is configured.
pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::RS256;

/// A `kid` header split into its tenant and key parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRef<'a> {
    pub tenant_id: &'a str,
    pub key_id: &'a str,
}

impl<'a> KeyRef<'a> {
    /// Split `<tenant id>/<key id>`. Exactly one `/` and two non-empty
    /// parts are required.
    pub fn parse(kid: &'a str) -> Option<Self> {
        let (tenant_id, key_id) = kid.split_once('/')?;
        if tenant_id.is_empty() || key_id.is_empty() || key_id.contains('/') {
            return None;
        }
        Some(Self { tenant_id, key_id })
    }
}

/// Verifies tokens against keys supplied by a [`KeyResolver`].
#[derive(Clone)]
pub struct TokenVerifier {
    algorithm: Algorithm,
    resolver: Arc<dyn KeyResolver>,
    validator: ClaimsValidator,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &self.algorithm)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Create a verifier expecting [`DEFAULT_ALGORITHM`].
    pub fn new(resolver: Arc<dyn KeyResolver>) -> Self {
        Self {
            algorithm: DEFAULT_ALGORITHM,
            resolver,
            validator: ClaimsValidator::new(),
        }
    }

    /// Set the expected signing algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Verify `token` and return its validated claims.
    ///
    /// # Errors
    /// One `AuthError` per verification step; see the module docs.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        if header.alg != self.algorithm {
            return Err(AuthError::UnsupportedAlgorithm {
                expected: self.algorithm,
                found: header.alg,
            });
        }

        let kid = header.kid.as_deref().ok_or(AuthError::MissingKeyId)?;
        let key_ref = KeyRef::parse(kid).ok_or_else(|| AuthError::InvalidKeyId(kid.to_string()))?;

        let key = self
            .resolver
            .resolve(key_ref.tenant_id, key_ref.key_id)
            .await
            .map_err(|e| {
                tracing::warn!(
                    tenant_id = %key_ref.tenant_id,
                    key_id = %key_ref.key_id,
                    error = %e,
                    "signing key lookup failed"
                );
                AuthError::KeyNotFound(e)
            })?;

        if key.algorithm() != self.algorithm {
            tracing::warn!(
                tenant_id = %key_ref.tenant_id,
                key_id = %key_ref.key_id,
                key_algorithm = ?key.algorithm(),
                "resolved key cannot verify the configured algorithm"
            );
            return Err(AuthError::InvalidSignature);
        }

        let claims = decode::<Claims>(token, key.decoding_key(), &self.signature_only())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidKeyFormat => AuthError::InvalidSignature,
                ErrorKind::Json(_) | ErrorKind::Utf8(_) | ErrorKind::Base64(_) => {
                    AuthError::InvalidClaims(e.to_string())
                }
                _ => AuthError::MalformedToken,
            })?
            .claims;

        self.validator.validate(&claims)?;

        // The signing key only vouches for the tenant it is published under.
        if claims.tenant_id != key_ref.tenant_id {
            tracing::warn!(
                key_tenant_id = %key_ref.tenant_id,
                claim_tenant_id = %claims.tenant_id,
                "token tenant differs from signing key tenant"
            );
            return Err(AuthError::InvalidClaims(format!(
                "tid '{}' is not the tenant of signing key '{kid}'",
                claims.tenant_id
            )));
        }

        tracing::debug!(
            tenant_id = %claims.tenant_id,
            subject = %claims.subject,
            "token verified"
        );

        Ok(claims)
    }

    /// Signature check only; claims are validated by [`ClaimsValidator`].
    fn signature_only(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation
    }
}
