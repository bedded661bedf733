// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) backed key resolution.
//!
//! Each tenant publishes its own key set. The endpoint is built from a URL
//! template containing `{tid}`, e.g. `https://idp.example.com/{tid}/jwks.json`.
//! Only tenant ids made of ASCII letters, digits, `-`, `_` and `.` are
//! substituted; anything else resolves to `NotFound` without a request.
//!
//! ## Caching
//!
//! - Key sets are cached per tenant with a configurable TTL
//! - A stale entry is served when a refresh fails (fail-open for availability)
//! - Lookups from concurrent requests share one cache behind an async `RwLock`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::RwLock;

use super::keys::{KeyResolveError, KeyResolver, VerificationKey};

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Placeholder replaced by the tenant id in the URL template.
pub const TENANT_PLACEHOLDER: &str = "{tid}";

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// Resolver that fetches and caches per-tenant key sets.
#[derive(Clone)]
pub struct JwksKeyResolver {
    /// Endpoint template, `{tid}` is substituted
    url_template: String,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached key sets by tenant
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksKeyResolver {
    /// Create a resolver for the given URL template.
    ///
    /// # Errors
    /// `Unavailable` if the HTTP client cannot be built.
    pub fn new(url_template: impl Into<String>) -> Result<Self, KeyResolveError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| KeyResolveError::Unavailable(format!("HTTP client: {e}")))?;

        Ok(Self {
            url_template: url_template.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(HashMap::new())),
            client,
        })
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Endpoint for a tenant, `None` when the tenant id is not a plain
    /// identifier and could reshape the URL.
    pub fn jwks_url(&self, tenant_id: &str) -> Option<String> {
        is_url_safe_tenant_id(tenant_id)
            .then(|| self.url_template.replace(TENANT_PLACEHOLDER, tenant_id))
    }

    /// Seed the cache, e.g. with keys shipped in configuration.
    pub async fn insert(&self, tenant_id: impl Into<String>, jwks: JwkSet) {
        self.cache.write().await.insert(
            tenant_id.into(),
            CacheEntry {
                jwks,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Check if a tenant's key set is cached and fresh.
    pub async fn is_cached(&self, tenant_id: &str) -> bool {
        self.cache
            .read()
            .await
            .get(tenant_id)
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }

    /// Force refresh a tenant's key set.
    ///
    /// # Errors
    /// `Unavailable` if the endpoint cannot be fetched or parsed.
    pub async fn refresh(&self, tenant_id: &str) -> Result<(), KeyResolveError> {
        let jwks = self.fetch_jwks(tenant_id).await?;
        self.insert(tenant_id, jwks).await;
        Ok(())
    }

    /// Get a tenant's key set, fetching when missing or stale.
    async fn get_jwks(&self, tenant_id: &str) -> Result<JwkSet, KeyResolveError> {
        let stale = {
            let cache = self.cache.read().await;
            match cache.get(tenant_id) {
                Some(entry) if entry.fetched_at.elapsed() < self.cache_ttl => {
                    return Ok(entry.jwks.clone());
                }
                Some(entry) => Some(entry.jwks.clone()),
                None => None,
            }
        };

        match self.fetch_jwks(tenant_id).await {
            Ok(jwks) => {
                self.insert(tenant_id, jwks.clone()).await;
                Ok(jwks)
            }
            Err(e) => match stale {
                Some(jwks) => {
                    tracing::warn!(
                        tenant_id = %tenant_id,
                        error = %e,
                        "JWKS refresh failed, serving stale keys"
                    );
                    Ok(jwks)
                }
                None => Err(e),
            },
        }
    }

    /// Fetch a key set from the tenant endpoint.
    async fn fetch_jwks(&self, tenant_id: &str) -> Result<JwkSet, KeyResolveError> {
        let url = self.jwks_url(tenant_id).ok_or_else(|| {
            KeyResolveError::Unavailable(format!("no JWKS endpoint for tenant '{tenant_id}'"))
        })?;
        tracing::debug!(tenant_id = %tenant_id, url = %url, "fetching JWKS");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| KeyResolveError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyResolveError::Unavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| KeyResolveError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl KeyResolver for JwksKeyResolver {
    async fn resolve(
        &self,
        tenant_id: &str,
        key_id: &str,
    ) -> Result<VerificationKey, KeyResolveError> {
        if !is_url_safe_tenant_id(tenant_id) {
            tracing::warn!(tenant_id = %tenant_id, "tenant id not usable in a JWKS URL");
            return Err(KeyResolveError::NotFound {
                tenant_id: tenant_id.to_string(),
                key_id: key_id.to_string(),
            });
        }
        let jwks = self.get_jwks(tenant_id).await?;
        select_key(&jwks, tenant_id, key_id)
    }
}

/// ASCII letters, digits, `-`, `_` and `.`, excluding the dot segments.
fn is_url_safe_tenant_id(tenant_id: &str) -> bool {
    !tenant_id.is_empty()
        && tenant_id != "."
        && tenant_id != ".."
        && tenant_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Find the key with a matching `kid` and convert it.
pub fn select_key(
    jwks: &JwkSet,
    tenant_id: &str,
    key_id: &str,
) -> Result<VerificationKey, KeyResolveError> {
    let jwk = jwks
        .keys
        .iter()
        .find(|k| k.common.key_id.as_deref() == Some(key_id))
        .ok_or_else(|| KeyResolveError::NotFound {
            tenant_id: tenant_id.to_string(),
            key_id: key_id.to_string(),
        })?;

    jwk_to_verification_key(jwk)
}

/// Convert a JWK to a verification key.
pub fn jwk_to_verification_key(jwk: &Jwk) -> Result<VerificationKey, KeyResolveError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|e| KeyResolveError::InvalidKey(format!("RSA key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                // Default for RSA
                _ => Algorithm::RS256,
            };

            Ok(VerificationKey::new(alg, key))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|e| KeyResolveError::InvalidKey(format!("EC key: {e}")))?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                // Default for EC
                _ => Algorithm::ES256,
            };

            Ok(VerificationKey::new(alg, key))
        }
        _ => Err(KeyResolveError::InvalidKey(
            "unsupported key type in JWKS".to_string(),
        )),
    }
}
