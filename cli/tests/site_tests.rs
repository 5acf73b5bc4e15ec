// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use learnhub_core::application::access_control::StandardAccessControlService;
use learnhub_core::domain::access_policy::{AccessPolicy, ProtectedPathTable, UnknownRolePolicy};
use learnhub_core::domain::gateway_config::GatewayConfigManifest;
use learnhub_core::domain::role::Role;
use learnhub_core::domain::session::UserId;
use learnhub_core::infrastructure::event_bus::EventBus;
use learnhub_core::infrastructure::repositories::{InMemoryProfileStore, InMemorySessionProvider};
use learnhub_core::presentation::{router, AccessGuard};
use learnhub_gateway::server::build_app;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::services::ServeDir;

fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Courses</h1>").unwrap();
    for page in ["auth", "dashboard", "dashboard/admin"] {
        let page_dir = dir.path().join(page);
        std::fs::create_dir_all(&page_dir).unwrap();
        std::fs::write(page_dir.join("index.html"), format!("<h1>{page}</h1>")).unwrap();
    }
    dir
}

fn app(site: &TempDir) -> axum::Router {
    let mut config = GatewayConfigManifest::default();
    config.spec.server.site_dir = site.path().to_path_buf();
    build_app(&config, EventBus::new(16)).unwrap()
}

async fn get(app: axum::Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_public_pages_are_served_from_site_dir() {
    let site = site();
    let response = get(app(&site), "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<h1>Courses</h1>");

    let response = get(app(&site), "/auth/").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dashboards_redirect_without_backend_session() {
    let site = site();
    for uri in [
        "/dashboard",
        "/dashboard/",
        "/dashboard/admin/index.html",
        "/dashboard/%61dmin",
        "/courses/../dashboard/admin",
    ] {
        let response = get(app(&site), uri).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth",
            "{uri}"
        );
    }
}

#[tokio::test]
async fn test_health_bypasses_guard() {
    let site = site();
    let response = get(app(&site), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_invalid_rule_table_is_rejected() {
    let site = site();
    let mut config = GatewayConfigManifest::default();
    config.spec.server.site_dir = site.path().to_path_buf();
    config.spec.protected_paths[0].path = "dashboard/admin".to_string();
    assert!(build_app(&config, EventBus::new(16)).is_err());
}

/// Site served from `site` with an admin and a profileless user signed in.
async fn signed_in_app(site: &TempDir) -> Router {
    let sessions = InMemorySessionProvider::new();
    let profiles = InMemoryProfileStore::new();
    sessions.sign_in("tok-admin", UserId::new("admin-1")).await;
    profiles.set_role(UserId::new("admin-1"), Role::Admin).await;
    sessions.sign_in("tok-ghost", UserId::new("ghost")).await;

    let service = StandardAccessControlService::new(
        AccessPolicy::new(ProtectedPathTable::default(), UnknownRolePolicy::SignIn),
        Arc::new(sessions),
        Arc::new(profiles),
        EventBus::new(16),
    );
    let guard = AccessGuard::new(Arc::new(service), "/auth", "sb-access-token");
    let pages = Router::new()
        .fallback_service(ServeDir::new(site.path()).append_index_html_on_directories(true));
    router(pages, guard)
}

async fn get_as(app: Router, uri: &str, token: &str) -> axum::response::Response {
    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

#[tokio::test]
async fn test_index_page_alias_gets_directory_decision() {
    let site = site();
    for uri in ["/dashboard", "/dashboard/", "/dashboard/index.html"] {
        let response = get_as(signed_in_app(&site).await, uri, "tok-admin").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/dashboard/admin",
            "{uri}"
        );

        let response = get_as(signed_in_app(&site).await, uri, "tok-ghost").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/auth", "{uri}");
    }

    let response = get_as(signed_in_app(&site).await, "/dashboard/admin/index.html", "tok-admin").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"<h1>dashboard/admin</h1>");
}
