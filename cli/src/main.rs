// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # LearnHub Gateway CLI
//!
//! The `learnhub` binary serves the pre-rendered marketplace site behind the
//! role-based access middleware.
//!
//! ## Commands
//!
//! - `learnhub serve` - Run the HTTP gateway
//! - `learnhub config show|validate|generate` - Configuration management
//! - `learnhub check <path> --as <visitor>` - Inspect a routing decision offline

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use learnhub_gateway::commands::{self, CheckArgs, ConfigCommand, ServeArgs};

/// LearnHub access gateway
#[derive(Parser)]
#[command(name = "learnhub")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "LEARNHUB_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LEARNHUB_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "LEARNHUB_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Show how a path would be routed for a given visitor
    #[command(name = "check")]
    Check(CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal outside development.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.log_json)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::handle_command(args, cli.config).await,
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
        Commands::Check(args) => commands::check::handle_command(args, cli.config).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .init();
    }

    Ok(())
}
