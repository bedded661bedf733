// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::KeyResolver;
use crate::middleware::{
    Authenticator, AuthnConfig, Authorizer, AuthzConfig, TenantResolver, TenantResolverConfig,
};

/// Shared pipeline state for the demo router.
#[derive(Debug, Clone)]
pub struct AppState {
    pub tenants: Arc<TenantResolver>,
    pub authenticator: Arc<Authenticator>,
    pub authorizer: Authorizer,
}

impl AppState {
    pub fn new(
        tenant_config: TenantResolverConfig,
        keys: Arc<dyn KeyResolver>,
        authn_config: AuthnConfig,
        authz_config: AuthzConfig,
    ) -> Self {
        Self {
            tenants: Arc::new(TenantResolver::new(tenant_config)),
            authenticator: Arc::new(Authenticator::new(keys, authn_config)),
            authorizer: Authorizer::new(authz_config),
        }
    }

    /// Default configuration for every stage.
    pub fn with_keys(keys: Arc<dyn KeyResolver>) -> Self {
        Self::new(
            TenantResolverConfig::default(),
            keys,
            AuthnConfig::default(),
            AuthzConfig::default(),
        )
    }
}
