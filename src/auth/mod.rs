// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Verification of tenant-scoped bearer tokens.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>`
//! 2. The token header names its signing key as `kid: "<tenant>/<key>"`
//! 3. Server:
//!    - Resolves the key through a pluggable `KeyResolver` (JWKS, static, ...)
//!    - Verifies algorithm, signature, mandatory claims and lifetime
//!    - Extracts:
//!      - `tid` → tenant the token is bound to
//!      - `perms` → permission set used for authorization
//!
//! ## Security
//!
//! - Only the configured signing algorithm is accepted (RS256 by default)
//! - `tid`, `sub`, `iss`, `iat` and `exp` are mandatory
//! - No clock skew tolerance

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod keys;
pub mod verifier;

pub use claims::{access_token_hash, Claims, ClaimsError, ClaimsValidator};
pub use error::{AuthError, AuthErrorBody};
pub use extractor::{Principal, Tenant, TokenSource, TokenSourceError};
pub use jwks::JwksKeyResolver;
pub use keys::{KeyResolveError, KeyResolver, StaticKeyResolver, VerificationKey};
pub use verifier::{KeyRef, TokenVerifier, DEFAULT_ALGORITHM};
