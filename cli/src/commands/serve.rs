// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

//! `learnhub serve`

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use learnhub_core::domain::gateway_config::GatewayConfigManifest;

use crate::server;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Bind address (overrides server.bind_address in the manifest)
    #[arg(long, env = "LEARNHUB_HOST")]
    pub host: Option<String>,

    /// Port (overrides server.port in the manifest)
    #[arg(long, env = "LEARNHUB_PORT")]
    pub port: Option<u16>,

    /// Directory of pre-rendered pages (overrides server.site_dir in the manifest)
    #[arg(long, value_name = "DIR")]
    pub site_dir: Option<PathBuf>,
}

impl ServeArgs {
    pub fn apply(&self, config: &mut GatewayConfigManifest) {
        if let Some(host) = &self.host {
            config.spec.server.bind_address = host.clone();
        }
        if let Some(port) = self.port {
            config.spec.server.port = port;
        }
        if let Some(site_dir) = &self.site_dir {
            config.spec.server.site_dir = site_dir.clone();
        }
    }
}

pub async fn handle_command(args: ServeArgs, config_override: Option<PathBuf>) -> Result<()> {
    let mut config = GatewayConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    args.apply(&mut config);

    config
        .validate()
        .context("Configuration validation failed")?;

    info!("Configuration loaded: {}", config.metadata.name);

    server::start_server(config).await
}
