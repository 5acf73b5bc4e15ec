// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Access Middleware
//!
//! axum middleware that runs the access decision before any page handler.
//!
//! ```text
//! incoming Request
//!   └─ extract_credentials(headers)            ← Bearer header, then session cookie
//!   └─ AccessControlService::evaluate(path, credentials)
//!         ├─ Allow            → next.run(request)
//!         └─ Redirect*        → 303 See Other, Location: <fixed target>
//! ```
//!
//! Redirects are marked `Cache-Control: no-store` because they depend on the
//! visitor's session.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use std::sync::Arc;

use crate::application::access_control::AccessControlService;
use crate::domain::session::SessionCredentials;

/// Shared state for [`enforce_access`].
#[derive(Clone)]
pub struct AccessGuard {
    pub service: Arc<dyn AccessControlService>,
    pub sign_in_path: Arc<str>,
    pub session_cookie: Arc<str>,
}

impl AccessGuard {
    pub fn new(
        service: Arc<dyn AccessControlService>,
        sign_in_path: &str,
        session_cookie: &str,
    ) -> Self {
        Self {
            service,
            sign_in_path: Arc::from(sign_in_path),
            session_cookie: Arc::from(session_cookie),
        }
    }
}

pub async fn enforce_access(
    State(guard): State<AccessGuard>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let credentials = extract_credentials(request.headers(), &guard.session_cookie);
    let decision = guard.service.evaluate(&path, &credentials).await;

    match decision.redirect_target(&guard.sign_in_path) {
        None => next.run(request).await,
        Some(location) => {
            let mut response = Redirect::to(location).into_response();
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            response
        }
    }
}

/// Pull the access token from `Authorization: Bearer` or, failing that, the
/// named session cookie.
pub fn extract_credentials(headers: &HeaderMap, session_cookie: &str) -> SessionCredentials {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return SessionCredentials::bearer(token);
    }

    let cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(|kv| kv.trim())
        .find_map(|kv| {
            let (name, value) = kv.split_once('=')?;
            (name == session_cookie).then_some(value)
        })
        .filter(|token| !token.is_empty());

    match cookie {
        Some(token) => SessionCredentials::bearer(token),
        None => SessionCredentials::anonymous(),
    }
}
