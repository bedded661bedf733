// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped tenant context.
//!
//! The tenant resolver creates one [`TenantContext`] per request and stores
//! it in the request extensions. Authentication later commits the verified
//! permission set into it, and authorization reads it back. It is dropped
//! with the request.

use std::collections::HashMap;

use axum::extract::Request;

use crate::authz::PermissionSet;

/// Default context key for the tenant id.
pub const DEFAULT_TENANT_KEY: &str = "tid";

/// Default context key for the permission set.
pub const DEFAULT_PERMISSIONS_KEY: &str = "perms";

/// A value in the request-scoped store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextValue {
    Text(String),
    Permissions(PermissionSet),
}

/// Tenant id plus an ephemeral key/value store for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: String,
    values: HashMap<String, ContextValue>,
}

impl TenantContext {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            values: HashMap::new(),
        }
    }

    /// The tenant the request was resolved to.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: ContextValue) {
        self.values.insert(key.into(), value);
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            ContextValue::Text(text) => Some(text),
            ContextValue::Permissions(_) => None,
        }
    }

    pub fn permissions(&self, key: &str) -> Option<&PermissionSet> {
        match self.values.get(key)? {
            ContextValue::Permissions(permissions) => Some(permissions),
            ContextValue::Text(_) => None,
        }
    }

    /// Borrow the context attached to a request, if any.
    pub fn of(request: &Request) -> Option<&TenantContext> {
        request.extensions().get::<TenantContext>()
    }

    /// Mutably borrow the context attached to a request, if any.
    pub fn of_mut(request: &mut Request) -> Option<&mut TenantContext> {
        request.extensions_mut().get_mut::<TenantContext>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn typed_accessors_only_return_matching_values() {
        let mut ctx = TenantContext::new("acme");
        ctx.set(DEFAULT_TENANT_KEY, ContextValue::Text("acme".to_string()));
        ctx.set(
            DEFAULT_PERMISSIONS_KEY,
            ContextValue::Permissions(["iam.users.read"].into_iter().collect()),
        );

        assert_eq!(ctx.tenant_id(), "acme");
        assert_eq!(ctx.text(DEFAULT_TENANT_KEY), Some("acme"));
        assert!(ctx.permissions(DEFAULT_TENANT_KEY).is_none());
        assert_eq!(ctx.permissions(DEFAULT_PERMISSIONS_KEY).map(PermissionSet::len), Some(1));
        assert!(ctx.text(DEFAULT_PERMISSIONS_KEY).is_none());
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn lives_in_request_extensions() {
        let mut request = Request::new(Body::empty());
        assert!(TenantContext::of(&request).is_none());

        request.extensions_mut().insert(TenantContext::new("acme"));
        TenantContext::of_mut(&mut request)
            .unwrap()
            .set("k", ContextValue::Text("v".to_string()));

        let ctx = TenantContext::of(&request).unwrap();
        assert_eq!(ctx.tenant_id(), "acme");
        assert_eq!(ctx.text("k"), Some("v"));
    }
}
