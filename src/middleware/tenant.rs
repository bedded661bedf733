// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant resolution middleware.
//!
//! Runs at the root of the router, before routing and authentication. The
//! tenant id is taken from the first non-empty of:
//!
//! 1. the tenant header (`X-TID`)
//! 2. the tenant query parameter (`tid`)
//! 3. the configured default tenant
//!
//! The resolved id is stored in a fresh [`TenantContext`] and is the tenant
//! every token must be bound to.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, HeaderName, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::AuthError;
use crate::context::{ContextValue, TenantContext, DEFAULT_TENANT_KEY};

/// Default tenant header.
pub const DEFAULT_TENANT_HEADER: &str = "x-tid";

/// Default tenant query parameter.
pub const DEFAULT_TENANT_QUERY_PARAM: &str = "tid";

/// Tenant resolution configuration.
#[derive(Debug, Clone)]
pub struct TenantResolverConfig {
    /// Header carrying the tenant id; takes precedence over the query
    pub header: HeaderName,
    /// Query parameter carrying the tenant id
    pub query_param: String,
    /// Fallback tenant when the request names none
    pub default_tenant: Option<String>,
    /// Context key the tenant id is mirrored under
    pub context_key: String,
}

impl Default for TenantResolverConfig {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static(DEFAULT_TENANT_HEADER),
            query_param: DEFAULT_TENANT_QUERY_PARAM.to_string(),
            default_tenant: None,
            context_key: DEFAULT_TENANT_KEY.to_string(),
        }
    }
}

impl TenantResolverConfig {
    pub fn with_header(mut self, header: HeaderName) -> Self {
        self.header = header;
        self
    }

    pub fn with_query_param(mut self, query_param: impl Into<String>) -> Self {
        self.query_param = query_param.into();
        self
    }

    pub fn with_default_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.default_tenant = Some(tenant_id.into());
        self
    }

    pub fn with_context_key(mut self, key: impl Into<String>) -> Self {
        self.context_key = key.into();
        self
    }
}

/// Resolves the tenant of a request.
#[derive(Debug, Clone, Default)]
pub struct TenantResolver {
    config: TenantResolverConfig,
}

impl TenantResolver {
    pub fn new(config: TenantResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TenantResolverConfig {
        &self.config
    }

    /// Resolve the tenant id from header, query, then default.
    ///
    /// # Errors
    /// `MissingTenant` if none of them yields a non-empty value.
    pub fn resolve(&self, headers: &HeaderMap, uri: &Uri) -> Result<String, AuthError> {
        let from_header = headers
            .get(&self.config.header)
            .and_then(|v| v.to_str().ok())
            .filter(|tid| !tid.is_empty())
            .map(str::to_string);

        let from_query = || {
            Query::<HashMap<String, String>>::try_from_uri(uri)
                .ok()
                .and_then(|Query(mut params)| params.remove(&self.config.query_param))
                .filter(|tid| !tid.is_empty())
        };

        let from_default = || {
            self.config
                .default_tenant
                .clone()
                .filter(|tid| !tid.is_empty())
        };

        from_header
            .or_else(from_query)
            .or_else(from_default)
            .ok_or(AuthError::MissingTenant)
    }

    /// Resolve the tenant and attach a fresh [`TenantContext`] to the request.
    ///
    /// # Errors
    /// See [`TenantResolver::resolve`].
    pub fn attach(&self, request: &mut Request) -> Result<String, AuthError> {
        let tenant_id = self.resolve(request.headers(), request.uri())?;

        let mut ctx = TenantContext::new(tenant_id.clone());
        ctx.set(
            self.config.context_key.clone(),
            ContextValue::Text(tenant_id.clone()),
        );
        request.extensions_mut().insert(ctx);

        Ok(tenant_id)
    }
}

/// Tenant resolution middleware function.
pub async fn tenant_middleware(
    State(resolver): State<Arc<TenantResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolver.attach(&mut request) {
        Ok(tenant_id) => {
            tracing::debug!(tenant_id = %tenant_id, "tenant resolved");
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(path = %request.uri().path(), error = %e, "tenant resolution failed");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str, header: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(tid) = header {
            builder = builder.header("X-TID", tid);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn resolve(
        resolver: &TenantResolver,
        uri: &str,
        header: Option<&str>,
    ) -> Result<String, AuthError> {
        let req = request(uri, header);
        resolver.resolve(req.headers(), req.uri())
    }

    fn with_default() -> TenantResolver {
        TenantResolver::new(TenantResolverConfig::default().with_default_tenant("example"))
    }

    #[test]
    fn header_beats_query_and_default() {
        assert_eq!(
            resolve(&with_default(), "/x?tid=from-query", Some("from-header")).unwrap(),
            "from-header"
        );
    }

    #[test]
    fn query_beats_default() {
        assert_eq!(
            resolve(&with_default(), "/x?tid=from-query", None).unwrap(),
            "from-query"
        );
    }

    #[test]
    fn default_is_the_last_resort() {
        assert_eq!(resolve(&with_default(), "/x", None).unwrap(), "example");
    }

    #[test]
    fn empty_values_fall_through() {
        assert_eq!(
            resolve(&with_default(), "/x?tid=", Some("")).unwrap(),
            "example"
        );
    }

    #[test]
    fn nothing_configured_is_missing_tenant() {
        let resolver = TenantResolver::default();
        assert!(matches!(
            resolve(&resolver, "/x", None),
            Err(AuthError::MissingTenant)
        ));
    }

    #[test]
    fn custom_header_and_query_names() {
        let resolver = TenantResolver::new(
            TenantResolverConfig::default()
                .with_header(HeaderName::from_static("x-tenant"))
                .with_query_param("tenant"),
        );
        let req = Request::builder()
            .uri("/x?tenant=q")
            .header("X-TID", "ignored")
            .body(Body::empty())
            .unwrap();
        assert_eq!(resolver.resolve(req.headers(), req.uri()).unwrap(), "q");

        let req = Request::builder()
            .uri("/x?tenant=q")
            .header("X-Tenant", "h")
            .body(Body::empty())
            .unwrap();
        assert_eq!(resolver.resolve(req.headers(), req.uri()).unwrap(), "h");
    }

    #[test]
    fn attach_writes_tenant_context() {
        let resolver =
            TenantResolver::new(TenantResolverConfig::default().with_context_key("tenant"));
        let mut req = request("/x", Some("acme"));

        assert_eq!(resolver.attach(&mut req).unwrap(), "acme");

        let ctx = TenantContext::of(&req).unwrap();
        assert_eq!(ctx.tenant_id(), "acme");
        assert_eq!(ctx.text("tenant"), Some("acme"));
    }
}
