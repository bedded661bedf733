// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization middleware for Axum.
//!
//! Each protected route names one required [`Permission`]. The guard reads
//! the permission set committed by authentication from the
//! [`TenantContext`] and admits the request if any held permission grants
//! the required one (`*` matches any value in its field).
//!
//! ```rust,ignore
//! let authz = Authorizer::new(AuthzConfig::default());
//! let read_users = Permission::parse("iam.users.read").unwrap();
//!
//! Router::new().route(
//!     "/users",
//!     get(list_users).layer(from_fn_with_state(authz.require(read_users), authz_middleware)),
//! );
//! ```

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{always, never, Skipper};
use crate::auth::AuthError;
use crate::authz::Permission;
use crate::context::{TenantContext, DEFAULT_PERMISSIONS_KEY};

/// Authorization configuration, shared by every guard built from it.
#[derive(Clone)]
pub struct AuthzConfig {
    /// Requests for which the permission check is bypassed
    pub skipper: Skipper,
    /// Context key the permission set is read from
    pub permissions_key: String,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            skipper: never(),
            permissions_key: DEFAULT_PERMISSIONS_KEY.to_string(),
        }
    }
}

impl fmt::Debug for AuthzConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthzConfig")
            .field("permissions_key", &self.permissions_key)
            .finish_non_exhaustive()
    }
}

impl AuthzConfig {
    /// Configuration that admits every request without checking.
    pub fn permit_all() -> Self {
        Self {
            skipper: always(),
            ..Self::default()
        }
    }

    pub fn with_skipper(mut self, skipper: Skipper) -> Self {
        self.skipper = skipper;
        self
    }

    pub fn with_permissions_key(mut self, key: impl Into<String>) -> Self {
        self.permissions_key = key.into();
        self
    }
}

/// Checks one required permission.
#[derive(Debug, Clone)]
pub struct PermissionGuard {
    required: Permission,
    config: AuthzConfig,
}

impl PermissionGuard {
    pub fn new(required: Permission, config: AuthzConfig) -> Self {
        Self { required, config }
    }

    pub fn required(&self) -> &Permission {
        &self.required
    }

    /// Decide whether `request` may proceed.
    ///
    /// # Errors
    /// - `MissingPermissionContext` if authentication committed no
    ///   permission set for the request
    /// - `PermissionDenied` if no held permission grants the required one
    pub fn check(&self, request: &Request) -> Result<(), AuthError> {
        if (self.config.skipper)(request) {
            return Ok(());
        }

        let held = TenantContext::of(request)
            .and_then(|ctx| ctx.permissions(&self.config.permissions_key))
            .ok_or_else(|| AuthError::MissingPermissionContext {
                required: self.required.id(),
            })?;

        if held.grants(&self.required) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied {
                required: self.required.id(),
            })
        }
    }
}

/// Builds per-route guards from one shared configuration.
#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    config: AuthzConfig,
}

impl Authorizer {
    pub fn new(config: AuthzConfig) -> Self {
        Self { config }
    }

    /// Guard state for [`authz_middleware`] requiring `permission`.
    pub fn require(&self, permission: Permission) -> Arc<PermissionGuard> {
        Arc::new(PermissionGuard::new(permission, self.config.clone()))
    }
}

/// Authorization middleware function.
pub async fn authz_middleware(
    State(guard): State<Arc<PermissionGuard>>,
    request: Request,
    next: Next,
) -> Response {
    match guard.check(&request) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!(
                path = %request.uri().path(),
                required = %guard.required(),
                error_code = e.error_code(),
                "authorization failed"
            );
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextValue;
    use crate::middleware::skip_paths;
    use axum::{
        body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Router,
    };
    use tower::ServiceExt;

    fn perm(id: &str) -> Permission {
        Permission::parse(id).unwrap()
    }

    fn request(path: &str, held: Option<&[&str]>) -> Request {
        let mut req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let mut ctx = TenantContext::new("acme");
        if let Some(held) = held {
            ctx.set(
                DEFAULT_PERMISSIONS_KEY,
                ContextValue::Permissions(held.iter().copied().collect()),
            );
        }
        req.extensions_mut().insert(ctx);
        req
    }

    fn guard(required: &str) -> PermissionGuard {
        PermissionGuard::new(perm(required), AuthzConfig::default())
    }

    #[test]
    fn exact_and_wildcard_grants() {
        let req = request("/", Some(&["iam.users.read", "billing.*.*"]));
        assert!(guard("iam.users.read").check(&req).is_ok());
        assert!(guard("billing.invoices.delete").check(&req).is_ok());
    }

    #[test]
    fn denied_names_the_required_permission() {
        let req = request("/", Some(&["iam.users.read"]));
        let err = guard("iam.users.delete").check(&req).unwrap_err();
        assert!(matches!(
            &err,
            AuthError::PermissionDenied { required } if required == "iam.users.delete"
        ));
        assert_eq!(err.to_string(), "unauthorized, needs perm of iam.users.delete");
    }

    #[test]
    fn empty_set_denies() {
        let req = request("/", Some(&[]));
        assert!(matches!(
            guard("iam.users.read").check(&req),
            Err(AuthError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn malformed_entries_are_ignored() {
        let req = request("/", Some(&["iam.users", "*", "iam.users.read.extra"]));
        assert!(matches!(
            guard("iam.users.read").check(&req),
            Err(AuthError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn missing_permission_context() {
        let req = request("/", None);
        assert!(matches!(
            guard("iam.users.read").check(&req),
            Err(AuthError::MissingPermissionContext { .. })
        ));

        let bare = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(matches!(
            guard("iam.users.read").check(&bare),
            Err(AuthError::MissingPermissionContext { .. })
        ));
    }

    #[test]
    fn permit_all_and_skipped_paths_bypass() {
        let req = request("/", None);
        let guard = PermissionGuard::new(perm("iam.users.read"), AuthzConfig::permit_all());
        assert!(guard.check(&req).is_ok());

        let config = AuthzConfig::default().with_skipper(skip_paths(["/public"]));
        let guard = PermissionGuard::new(perm("iam.users.read"), config);
        assert!(guard.check(&request("/public/info", None)).is_ok());
        assert!(guard.check(&request("/private", None)).is_err());
    }

    #[test]
    fn custom_permissions_key() {
        let mut req = request("/", None);
        TenantContext::of_mut(&mut req).unwrap().set(
            "scopes",
            ContextValue::Permissions(["iam.*.read"].into_iter().collect()),
        );
        let config = AuthzConfig::default().with_permissions_key("scopes");
        let guard = PermissionGuard::new(perm("iam.users.read"), config);
        assert!(guard.check(&req).is_ok());
    }

    #[tokio::test]
    async fn middleware_maps_outcomes_to_status() {
        let authz = Authorizer::default();
        let app = Router::new().route(
            "/users",
            get(|| async { "users" })
                .layer(from_fn_with_state(authz.require(perm("iam.users.read")), authz_middleware)),
        );

        let allowed = app
            .clone()
            .oneshot(request("/users", Some(&["iam.users.read"])))
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);

        let denied = app
            .clone()
            .oneshot(request("/users", Some(&["iam.groups.read"])))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let unauthenticated = app.oneshot(request("/users", None)).await.unwrap();
        assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);
    }
}
