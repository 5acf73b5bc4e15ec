// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Gateway HTTP server wiring

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use learnhub_core::{
    application::access_control::StandardAccessControlService,
    domain::gateway_config::GatewayConfigManifest,
    domain::repository::{ProfileStore, SessionProvider},
    infrastructure::{
        event_bus::{EventBus, EventBusError, EventReceiver},
        repositories::{InMemoryProfileStore, InMemorySessionProvider},
        supabase::SupabaseClient,
    },
    presentation::{router, AccessGuard},
};

/// Build the access guard described by `config`.
///
/// Without a Supabase section the gateway uses empty in-memory stores, so
/// every visitor is anonymous.
pub fn build_guard(config: &GatewayConfigManifest, event_bus: EventBus) -> Result<AccessGuard> {
    let policy = config
        .access_policy()
        .context("Invalid protected path rules")?;

    let (sessions, profiles): (Arc<dyn SessionProvider>, Arc<dyn ProfileStore>) =
        match &config.spec.supabase {
            Some(supabase) => {
                let client = Arc::new(
                    SupabaseClient::from_config(supabase)
                        .context("Failed to initialize Supabase client")?,
                );
                info!("Using Supabase backend at {}", supabase.url);
                let sessions: Arc<dyn SessionProvider> = client.clone();
                let profiles: Arc<dyn ProfileStore> = client;
                (sessions, profiles)
            }
            None => {
                warn!("No Supabase backend configured; all visitors will be treated as anonymous");
                let sessions: Arc<dyn SessionProvider> = Arc::new(InMemorySessionProvider::new());
                let profiles: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
                (sessions, profiles)
            }
        };

    let service = StandardAccessControlService::new(policy, sessions, profiles, event_bus)
        .with_lookup_timeout(config.spec.auth.lookup_timeout);

    Ok(AccessGuard::new(
        Arc::new(service),
        &config.spec.auth.sign_in_path,
        &config.spec.auth.session_cookie,
    ))
}

/// Site router: static pages from `site_dir`, guarded.
pub fn build_app(config: &GatewayConfigManifest, event_bus: EventBus) -> Result<Router> {
    let guard = build_guard(config, event_bus)?;
    let site = Router::new().fallback_service(
        ServeDir::new(&config.spec.server.site_dir).append_index_html_on_directories(true),
    );
    Ok(router(site, guard))
}

pub async fn start_server(config: GatewayConfigManifest) -> Result<()> {
    let event_bus = EventBus::with_default_capacity();
    tokio::spawn(audit_log(event_bus.subscribe()));

    let app = build_app(&config, event_bus)?;

    let addr = format!(
        "{}:{}",
        config.spec.server.bind_address, config.spec.server.port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        "Gateway listening on {} (site: {})",
        addr,
        config.spec.server.site_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Gateway shutting down");

    Ok(())
}

/// Forward access events to the `learnhub::audit` log target.
async fn audit_log(mut receiver: EventReceiver) {
    loop {
        match receiver.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => info!(target: "learnhub::audit", "{}", json),
                Err(e) => warn!("Failed to serialize access event: {}", e),
            },
            Err(EventBusError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
