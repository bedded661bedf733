// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant Auth - multi-tenant bearer token authentication and authorization
//!
//! Axum middlewares that resolve the tenant of each request, verify a signed
//! bearer token whose key is scoped to a tenant, bind the token to that
//! tenant and check hierarchical `service.resource.action` permissions with
//! `*` wildcards.
//!
//! ## Modules
//!
//! - `auth` - Token extraction, key resolution, verification and claims
//! - `authz` - Permissions and wildcard grant matching
//! - `context` - Per-request tenant context
//! - `middleware` - Tenant, authentication, authorization and debug layers
//! - `api` - Demo HTTP API wiring the pipeline
//! - `config` / `logging` - Runtime configuration for the demo binary

pub mod api;
pub mod auth;
pub mod authz;
pub mod config;
pub mod context;
pub mod logging;
pub mod middleware;
pub mod state;

#[cfg(test)]
mod test_support;
