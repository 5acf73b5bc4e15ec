// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use super::middleware::{enforce_access, AccessGuard};

/// Wrap the site's routes with the access middleware and add `/health`,
/// which stays outside the guard.
pub fn router(site: Router, guard: AccessGuard) -> Router {
    site.layer(middleware::from_fn_with_state(guard, enforce_access))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
