// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification keys and the resolver seam that supplies them.
//!
//! The verifier never stores keys. For every token it asks a
//! [`KeyResolver`] for the key named by `(tenant id, key id)`. Resolvers are
//! shared by all in-flight requests, so they must be safe to call
//! concurrently; caching is their business.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};

/// Errors produced by a [`KeyResolver`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyResolveError {
    #[error("no key '{key_id}' for tenant '{tenant_id}'")]
    NotFound { tenant_id: String, key_id: String },
    #[error("key store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

/// Public key material tagged with the algorithm it verifies.
#[derive(Clone)]
pub struct VerificationKey {
    algorithm: Algorithm,
    key: DecodingKey,
}

impl VerificationKey {
    pub fn new(algorithm: Algorithm, key: DecodingKey) -> Self {
        Self { algorithm, key }
    }

    /// RSA public key in PEM (PKCS#1 or SPKI).
    ///
    /// # Errors
    /// `InvalidKey` if the PEM cannot be parsed.
    pub fn from_rsa_pem(algorithm: Algorithm, pem: &[u8]) -> Result<Self, KeyResolveError> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| KeyResolveError::InvalidKey(format!("RSA PEM: {e}")))?;
        Ok(Self::new(algorithm, key))
    }

    /// EC public key in PEM.
    ///
    /// # Errors
    /// `InvalidKey` if the PEM cannot be parsed.
    pub fn from_ec_pem(algorithm: Algorithm, pem: &[u8]) -> Result<Self, KeyResolveError> {
        let key = DecodingKey::from_ec_pem(pem)
            .map_err(|e| KeyResolveError::InvalidKey(format!("EC PEM: {e}")))?;
        Ok(Self::new(algorithm, key))
    }

    /// Shared HMAC secret.
    pub fn from_secret(algorithm: Algorithm, secret: &[u8]) -> Self {
        Self::new(algorithm, DecodingKey::from_secret(secret))
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Maps `(tenant id, key id)` to a verification key.
///
/// Any `Fn(&str, &str) -> Result<VerificationKey, KeyResolveError>` closure
/// is a resolver too.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(
        &self,
        tenant_id: &str,
        key_id: &str,
    ) -> Result<VerificationKey, KeyResolveError>;
}

#[async_trait]
impl<F> KeyResolver for F
where
    F: Fn(&str, &str) -> Result<VerificationKey, KeyResolveError> + Send + Sync,
{
    async fn resolve(
        &self,
        tenant_id: &str,
        key_id: &str,
    ) -> Result<VerificationKey, KeyResolveError> {
        self(tenant_id, key_id)
    }
}

/// In-memory resolver over a fixed set of keys.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyResolver {
    keys: HashMap<(String, String), VerificationKey>,
}

impl StaticKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, replacing any previous key with the same ids.
    pub fn with_key(
        mut self,
        tenant_id: impl Into<String>,
        key_id: impl Into<String>,
        key: VerificationKey,
    ) -> Self {
        self.insert(tenant_id, key_id, key);
        self
    }

    pub fn insert(
        &mut self,
        tenant_id: impl Into<String>,
        key_id: impl Into<String>,
        key: VerificationKey,
    ) {
        self.keys.insert((tenant_id.into(), key_id.into()), key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(
        &self,
        tenant_id: &str,
        key_id: &str,
    ) -> Result<VerificationKey, KeyResolveError> {
        self.keys
            .get(&(tenant_id.to_string(), key_id.to_string()))
            .cloned()
            .ok_or_else(|| KeyResolveError::NotFound {
                tenant_id: tenant_id.to_string(),
                key_id: key_id.to_string(),
            })
    }
}
