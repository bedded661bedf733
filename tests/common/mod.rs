// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, Response, StatusCode},
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tower::ServiceExt;

use tenant_auth::auth::{Claims, KeyResolver, StaticKeyResolver, VerificationKey};

// Keep the block below textually identical to its twin in
// `src/test_support.rs` / `tests/common/mod.rs`: unit tests cannot see the
// integration test helpers and integration tests cannot see `cfg(test)` code.

pub const RSA_PRIVATE_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/rsa_private.pem"));
pub const RSA_PUBLIC_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/rsa_public.pem"));
pub const OTHER_RSA_PRIVATE_PEM: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/rsa_other_private.pem"));

/// JWK modulus of `RSA_PUBLIC_PEM`.
pub const RSA_PUBLIC_N: &str = "8K6HAyGp0_qSuB5C0Dj09aMOoh-k5lUVULzDN01vPsU2J1UglB3Ba78Jmm1qDZJ0tr4D57jlmmkCunWArd376KxN45aiOXFkX4q1TU7YVeW0up-yXXo0TtdelUuHwQXWQagmaa_xx2FoHklGx1FbYfcUjkxtPBhHLqIKXfa6seaLXo1GIMzT6KTr8GfZ2cfVr6xZsNnbNavu1gt3M67VhTctcdiSxG9yHweDrgL3gVjm5K0_V6kcRqqX5skuN6vqUl3RRgc2E9W3JNmPOQnfDb19TYus6FQq8Ok8dRWKNKKdUXR4iJoIfKQwD8PFmKmNR-1CfY2Xay_7tR4dXz2dJw";
/// JWK exponent of `RSA_PUBLIC_PEM`.
pub const RSA_PUBLIC_E: &str = "AQAB";

/// Claims that pass validation for the next hour.
pub fn valid_claims(tenant_id: &str, permissions: &[&str]) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
        tenant_id: tenant_id.to_string(),
        subject: "user_123".to_string(),
        issuer: "https://idp.example.com".to_string(),
        issued_at: now - 10,
        expires_at: now + 3600,
        permissions: permissions.iter().copied().collect(),
        ..Default::default()
    }
}

/// RS256 token signed with the primary test key.
pub fn mint_token(kid: Option<&str>, claims: &Claims) -> String {
    mint_token_with(RSA_PRIVATE_PEM, kid, claims)
}

/// RS256 token signed with `private_pem`.
pub fn mint_token_with(private_pem: &str, kid: Option<&str>, claims: &Claims) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(private_pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// Resolver knowing `acme/key1`.
pub fn static_keys() -> Arc<dyn KeyResolver> {
    let key = VerificationKey::from_rsa_pem(Algorithm::RS256, RSA_PUBLIC_PEM.as_bytes()).unwrap();
    Arc::new(StaticKeyResolver::new().with_key("acme", "key1", key))
}

/// Token for `acme/key1` carrying `permissions`.
pub fn token(tenant_id: &str, permissions: &[&str]) -> String {
    mint_token(Some("acme/key1"), &valid_claims(tenant_id, permissions))
}

pub fn request(
    method: Method,
    uri: &str,
    tenant: Option<&str>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(tid) = tenant {
        builder = builder.header("X-TID", tid);
    }
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response: Response<Body> = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
