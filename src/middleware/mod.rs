// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Pipeline Middleware
//!
//! Axum middleware for the tenant / authentication / authorization
//! pipeline. For a given request the stages must run in this order:
//!
//! 1. [`tenant::tenant_middleware`] resolves the tenant (root level)
//! 2. [`authn::authn_middleware`] verifies the token and binds it to the tenant
//! 3. [`authz::authz_middleware`] checks one required permission per route
//!
//! ```rust,ignore
//! let authz = Authorizer::new(AuthzConfig::default());
//!
//! let v1 = Router::new()
//!     .route(
//!         "/users",
//!         get(list_users).layer(from_fn_with_state(
//!             authz.require(Permission::parse("iam.users.read").unwrap()),
//!             authz_middleware,
//!         )),
//!     )
//!     .layer(from_fn_with_state(authenticator, authn_middleware));
//!
//! let app = Router::new()
//!     .nest("/v1", v1)
//!     .layer(from_fn_with_state(tenant_resolver, tenant_middleware));
//! ```
//!
//! Axum runs the last added layer first, so the tenant layer goes on the
//! outermost router.

use std::sync::Arc;

use axum::extract::Request;

pub mod authn;
pub mod authz;
pub mod header_dump;
pub mod tenant;

pub use authn::{authn_middleware, AuthnConfig, Authenticator};
pub use authz::{authz_middleware, Authorizer, AuthzConfig, PermissionGuard};
pub use header_dump::{header_dump_middleware, HeaderDumpConfig};
pub use tenant::{tenant_middleware, TenantResolver, TenantResolverConfig};

/// Predicate that lets a request bypass a middleware.
pub type Skipper = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Never skip.
pub fn never() -> Skipper {
    Arc::new(|_| false)
}

/// Always skip.
pub fn always() -> Skipper {
    Arc::new(|_| true)
}

/// Skip requests whose path starts with any of `prefixes`.
///
/// Use this for public endpoints such as health checks.
pub fn skip_paths<I, S>(prefixes: I) -> Skipper
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
    Arc::new(move |request: &Request| {
        let path = request.uri().path();
        prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    })
}
