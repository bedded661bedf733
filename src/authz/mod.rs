// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Primitives
//!
//! Permission identifiers and wildcard grant matching. These are pure
//! functions; the request-level check lives in `middleware::authz`.

pub mod permission;

pub use permission::{Permission, PermissionError, PermissionSet, WILDCARD};
