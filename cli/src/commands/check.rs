// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

//! `learnhub check`: dry-run a path through the configured access policy.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use learnhub_core::domain::access_policy::{AccessPolicy, RoutingDecision, Visitor};
use learnhub_core::domain::gateway_config::GatewayConfigManifest;
use learnhub_core::domain::role::Role;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Requested path, e.g. /dashboard/admin/users
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Visitor to evaluate as
    #[arg(long = "as", value_enum, default_value_t = VisitorKind::Anonymous)]
    pub visitor: VisitorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VisitorKind {
    Anonymous,
    /// Signed in, but the role could not be determined
    Unknown,
    Student,
    Instructor,
    Admin,
}

impl From<VisitorKind> for Visitor {
    fn from(kind: VisitorKind) -> Self {
        match kind {
            VisitorKind::Anonymous => Visitor::Anonymous,
            VisitorKind::Unknown => Visitor::unknown_role(),
            VisitorKind::Student => Visitor::with_role(Role::Student),
            VisitorKind::Instructor => Visitor::with_role(Role::Instructor),
            VisitorKind::Admin => Visitor::with_role(Role::Admin),
        }
    }
}

/// Outcome of a dry run, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub decision: RoutingDecision,
    pub rule: Option<String>,
    pub location: Option<String>,
}

pub fn evaluate(
    policy: &AccessPolicy,
    sign_in_path: &str,
    path: &str,
    visitor: VisitorKind,
) -> CheckOutcome {
    let decision = policy.evaluate(path, &Visitor::from(visitor));
    let rule = policy.protecting_rule(path).map(|rule| {
        let role = rule
            .required_role
            .map(|r| r.to_string())
            .unwrap_or_else(|| "any authenticated".to_string());
        format!("{} ({})", rule.path, role)
    });
    CheckOutcome {
        decision,
        rule,
        location: decision.redirect_target(sign_in_path).map(str::to_string),
    }
}

pub async fn handle_command(args: CheckArgs, config_override: Option<PathBuf>) -> Result<()> {
    let config = GatewayConfigManifest::load_or_default(config_override)
        .context("Failed to load configuration")?;
    let policy = config
        .access_policy()
        .context("Invalid protected path rules")?;

    let outcome = evaluate(
        &policy,
        &config.spec.auth.sign_in_path,
        &args.path,
        args.visitor,
    );

    println!("Path: {}", args.path.bold());
    match &outcome.rule {
        Some(rule) => println!("Rule: {}", rule),
        None => println!("Rule: {}", "(public)".dimmed()),
    }
    match &outcome.location {
        None => println!("{}", "✓ allow".green()),
        Some(location) => println!(
            "{} → {}",
            outcome.decision.label().yellow(),
            location.bold()
        ),
    }

    Ok(())
}
