// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Must run after [`tenant_middleware`](super::tenant::tenant_middleware).
//! For every request that is not skipped:
//!
//! 1. **Extract** the raw token from the configured [`TokenSource`]
//! 2. **Verify** it with the [`TokenVerifier`]
//! 3. **Bind** it: the token's `tid` must equal the resolved tenant
//! 4. **Commit** the permission set into the [`TenantContext`] and the
//!    verified [`Claims`] into the request extensions
//!
//! Nothing is committed unless all steps succeed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let resolver = Arc::new(JwksKeyResolver::new("https://idp.example.com/{tid}/jwks.json")?);
//! let authenticator = Arc::new(Authenticator::new(
//!     resolver,
//!     AuthnConfig::default().with_skipper(skip_paths(["/health"])),
//! ));
//!
//! let app = Router::new()
//!     .route("/v1/me", get(me))
//!     .layer(from_fn_with_state(authenticator, authn_middleware));
//! ```

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::Algorithm;

use super::{never, Skipper};
use crate::auth::{AuthError, Claims, KeyResolver, TokenSource, TokenVerifier, DEFAULT_ALGORITHM};
use crate::context::{ContextValue, TenantContext, DEFAULT_PERMISSIONS_KEY};

/// Runs before authentication on every non-skipped request.
pub type BeforeHook = Arc<dyn Fn(&mut Request) + Send + Sync>;

/// Runs after a successful authentication, before the handler.
pub type SuccessHook = Arc<dyn Fn(&Claims, &mut Request) + Send + Sync>;

/// Builds the response for a failed authentication.
pub type ErrorHook = Arc<dyn Fn(AuthError) -> Response + Send + Sync>;

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthnConfig {
    /// Where the token is read from
    pub token_source: TokenSource,
    /// The only accepted signing algorithm
    pub algorithm: Algorithm,
    /// Context key the permission set is committed under
    pub permissions_key: String,
    /// Requests for which authentication is bypassed
    pub skipper: Skipper,
    pub before: Option<BeforeHook>,
    pub on_success: Option<SuccessHook>,
    pub on_error: Option<ErrorHook>,
}

impl Default for AuthnConfig {
    fn default() -> Self {
        Self {
            token_source: TokenSource::default(),
            algorithm: DEFAULT_ALGORITHM,
            permissions_key: DEFAULT_PERMISSIONS_KEY.to_string(),
            skipper: never(),
            before: None,
            on_success: None,
            on_error: None,
        }
    }
}

impl fmt::Debug for AuthnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthnConfig")
            .field("token_source", &self.token_source)
            .field("algorithm", &self.algorithm)
            .field("permissions_key", &self.permissions_key)
            .finish_non_exhaustive()
    }
}

impl AuthnConfig {
    pub fn with_token_source(mut self, source: TokenSource) -> Self {
        self.token_source = source;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_permissions_key(mut self, key: impl Into<String>) -> Self {
        self.permissions_key = key.into();
        self
    }

    pub fn with_skipper(mut self, skipper: Skipper) -> Self {
        self.skipper = skipper;
        self
    }

    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    pub fn on_success<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Claims, &mut Request) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(hook));
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(AuthError) -> Response + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }
}

/// Token verifier plus the pipeline configuration around it.
#[derive(Debug)]
pub struct Authenticator {
    verifier: TokenVerifier,
    config: AuthnConfig,
}

impl Authenticator {
    pub fn new(resolver: Arc<dyn KeyResolver>, config: AuthnConfig) -> Self {
        Self {
            verifier: TokenVerifier::new(resolver).with_algorithm(config.algorithm),
            config,
        }
    }

    pub fn config(&self) -> &AuthnConfig {
        &self.config
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Authenticate `request` against its resolved tenant.
    ///
    /// On success the permission set is committed to the [`TenantContext`]
    /// and the claims are inserted into the request extensions. On failure
    /// the request is left untouched.
    ///
    /// # Errors
    /// Any token, claims or binding failure. `MissingTenant` if no tenant
    /// was resolved for the request.
    pub async fn authenticate(&self, request: &mut Request) -> Result<Claims, AuthError> {
        let token = self
            .config
            .token_source
            .extract(request.headers(), request.uri())?;

        let claims = self.verifier.verify(&token).await?;

        let Some(ctx) = TenantContext::of_mut(request) else {
            tracing::error!("no tenant context; tenant resolution must run before authentication");
            return Err(AuthError::MissingTenant);
        };

        if ctx.tenant_id() != claims.tenant_id {
            return Err(AuthError::TenantMismatch {
                request_tenant: ctx.tenant_id().to_string(),
                token_tenant: claims.tenant_id.clone(),
            });
        }

        ctx.set(
            self.config.permissions_key.clone(),
            ContextValue::Permissions(claims.permissions.clone()),
        );
        request.extensions_mut().insert(claims.clone());

        Ok(claims)
    }
}

/// Authentication middleware function.
pub async fn authn_middleware(
    State(authenticator): State<Arc<Authenticator>>,
    mut request: Request,
    next: Next,
) -> Response {
    let config = authenticator.config();

    if (config.skipper)(&request) {
        tracing::debug!(path = %request.uri().path(), "authentication skipped");
        return next.run(request).await;
    }

    if let Some(before) = &config.before {
        before(&mut request);
    }

    match authenticator.authenticate(&mut request).await {
        Ok(claims) => {
            tracing::debug!(
                subject = %claims.subject,
                tenant_id = %claims.tenant_id,
                "request authenticated"
            );
            if let Some(on_success) = &config.on_success {
                on_success(&claims, &mut request);
            }
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                path = %request.uri().path(),
                error = %e,
                error_code = e.error_code(),
                "authentication failed"
            );
            match &config.on_error {
                Some(on_error) => on_error(e),
                None => e.into_response(),
            }
        }
    }
}
