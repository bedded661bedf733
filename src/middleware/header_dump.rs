// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Debug middleware that logs request headers.
//!
//! Credentials are never written out: values of the redacted headers
//! (`Authorization` and `Cookie` by default) are replaced with a marker.

use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap, HeaderName,
    },
    middleware::Next,
    response::Response,
};

use super::{never, Skipper};

const REDACTED: &str = "<redacted>";
const NON_TEXT: &str = "<non-text>";

#[derive(Clone)]
pub struct HeaderDumpConfig {
    pub skipper: Skipper,
    /// Headers whose values are never logged
    pub redact: Vec<HeaderName>,
}

impl Default for HeaderDumpConfig {
    fn default() -> Self {
        Self {
            skipper: never(),
            redact: vec![AUTHORIZATION, COOKIE],
        }
    }
}

impl fmt::Debug for HeaderDumpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderDumpConfig")
            .field("redact", &self.redact)
            .finish_non_exhaustive()
    }
}

impl HeaderDumpConfig {
    pub fn with_skipper(mut self, skipper: Skipper) -> Self {
        self.skipper = skipper;
        self
    }

    pub fn redacting(mut self, header: HeaderName) -> Self {
        self.redact.push(header);
        self
    }

    /// Header name/value pairs as they will be logged.
    pub fn render(&self, headers: &HeaderMap) -> Vec<(String, String)> {
        headers
            .iter()
            .map(|(name, value)| {
                let shown = if self.redact.contains(name) {
                    REDACTED
                } else {
                    value.to_str().unwrap_or(NON_TEXT)
                };
                (name.to_string(), shown.to_string())
            })
            .collect()
    }
}

/// Header dump middleware function.
pub async fn header_dump_middleware(
    State(config): State<Arc<HeaderDumpConfig>>,
    request: Request,
    next: Next,
) -> Response {
    if !(config.skipper)(&request) {
        for (name, value) in config.render(request.headers()) {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                header = %name,
                value = %value,
                "request header"
            );
        }
    }
    next.run(request).await
}
