// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Demo HTTP API wiring the full tenant / authn / authz pipeline.

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    auth::{AuthErrorBody, Claims},
    authz::{Permission, PermissionError, PermissionSet},
    middleware::{authn_middleware, authz_middleware, tenant_middleware},
    state::AppState,
};

pub mod health;
pub mod users;

/// Permission required to list users.
pub const READ_USERS: &str = "iam.users.read";

/// Permission required to delete a user.
pub const DELETE_USERS: &str = "iam.users.delete";

/// Build the demo router.
///
/// `/health` and `/api-doc/openapi.json` are public. Everything under
/// `/v1` is tenant resolved and authenticated, and the user routes are
/// permission guarded.
///
/// # Errors
/// Returns an error if a route permission is malformed.
pub fn router(state: AppState) -> Result<Router, PermissionError> {
    let read_users: Permission = READ_USERS.parse()?;
    let delete_users: Permission = DELETE_USERS.parse()?;

    let v1_routes = Router::new()
        .route("/me", get(users::me))
        .route(
            "/users",
            get(users::list_users).layer(from_fn_with_state(
                state.authorizer.require(read_users),
                authz_middleware,
            )),
        )
        .route(
            "/users/{id}",
            delete(users::delete_user).layer(from_fn_with_state(
                state.authorizer.require(delete_users),
                authz_middleware,
            )),
        )
        .layer(from_fn_with_state(
            state.authenticator.clone(),
            authn_middleware,
        ));

    let tenant_routes = Router::new()
        .nest("/v1", v1_routes)
        .layer(from_fn_with_state(state.tenants.clone(), tenant_middleware));

    Ok(Router::new()
        .route("/health", get(health::health))
        .route("/api-doc/openapi.json", get(openapi))
        .merge(tenant_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        users::me,
        users::list_users,
        users::delete_user
    ),
    components(
        schemas(
            health::HealthResponse,
            users::MeResponse,
            users::UserListResponse,
            AuthErrorBody,
            Claims,
            PermissionSet
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Users", description = "Tenant-scoped user endpoints")
    )
)]
struct ApiDoc;
