// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tenant_auth::{
    api::router,
    auth::JwksKeyResolver,
    config::ServiceConfig,
    logging,
    middleware::{AuthnConfig, AuthzConfig, TenantResolverConfig},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env()?;
    logging::init(config.log_format);

    let keys = JwksKeyResolver::new(config.jwks_url_template.clone())?
        .with_cache_ttl(config.jwks_cache_ttl);

    let mut tenant_config = TenantResolverConfig::default();
    if let Some(tenant_id) = &config.default_tenant {
        tenant_config = tenant_config.with_default_tenant(tenant_id.clone());
    }

    let state = AppState::new(
        tenant_config,
        Arc::new(keys),
        AuthnConfig::default(),
        AuthzConfig::default(),
    );
    let app = router(state)?;

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        jwks_url_template = %config.jwks_url_template,
        default_tenant = ?config.default_tenant,
        "tenant auth demo listening (OpenAPI at /api-doc/openapi.json)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received SIGINT, shutting down");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
}
