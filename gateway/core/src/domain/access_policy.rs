// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Access Policy
//!
//! Pure routing decision for a single request. The evaluator sees only the
//! requested path and what is already known about the visitor; session and
//! profile lookups happen in [`crate::application::access_control`] and their
//! outcome is passed in as a [`Visitor`].
//!
//! ## Decision Flow
//!
//! ```text
//! path ─ normalize ─ ProtectedPathTable::find
//!   ├─ no rule                      → Allow (public)
//!   ├─ rule, Visitor::Anonymous     → RedirectToSignIn
//!   └─ rule, Visitor::Authenticated
//!        ├─ no role required         → Allow
//!        ├─ role matches             → Allow
//!        ├─ mismatch, home ≠ path    → RedirectToRoleHome(role)
//!        └─ mismatch, home == path   → UnknownRolePolicy (unknown role)
//!                                      RedirectToSignIn (known role)
//! ```
//!
//! ## Invariants
//!
//! - Rules are consulted most-specific-first: longer paths before shorter
//!   ones, `exact` before `prefix` at equal length.
//! - Prefix matching is segment-aware; `/dashboard/admin` does not cover
//!   `/dashboard/administer`.
//! - A redirect target is always either a fixed role home or the configured
//!   sign-in path. No request input is interpolated into it.
//! - The evaluator holds no per-request state, so evaluating the same input
//!   twice yields the same decision.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

use super::role::{Role, RoleResolution, ADMIN_DASHBOARD, GENERIC_DASHBOARD, INSTRUCTOR_DASHBOARD};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Protected path must start with '/': {0}")]
    NotAbsolute(String),

    #[error("Protected path is not in canonical form: '{path}' (expected '{canonical}')")]
    NotCanonical { path: String, canonical: String },

    #[error("Duplicate protected path rule: {path} ({kind:?})")]
    Duplicate { path: String, kind: MatchKind },

    #[error("Rule for {path} requires role {required}, which locks {role} out of its own dashboard")]
    HomeUnreachable {
        path: String,
        required: Role,
        role: Role,
    },
}

/// How a rule's path is compared with the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    #[default]
    Prefix,
}

/// A protected route. `role: None` admits any authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedPathRule {
    pub path: String,

    #[serde(rename = "match", default)]
    pub match_kind: MatchKind,

    #[serde(rename = "role", default, skip_serializing_if = "Option::is_none")]
    pub required_role: Option<Role>,
}

impl ProtectedPathRule {
    pub fn new(
        path: impl Into<String>,
        match_kind: MatchKind,
        required_role: Option<Role>,
    ) -> Result<Self, RuleError> {
        let rule = Self {
            path: path.into(),
            match_kind,
            required_role,
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn prefix(path: &str, required_role: Option<Role>) -> Result<Self, RuleError> {
        Self::new(path, MatchKind::Prefix, required_role)
    }

    pub fn exact(path: &str, required_role: Option<Role>) -> Result<Self, RuleError> {
        Self::new(path, MatchKind::Exact, required_role)
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if !self.path.starts_with('/') {
            return Err(RuleError::NotAbsolute(self.path.clone()));
        }
        let canonical = normalize_path(&self.path);
        if canonical != self.path {
            return Err(RuleError::NotCanonical {
                path: self.path.clone(),
                canonical,
            });
        }
        Ok(())
    }

    /// `path` must already be normalized.
    pub fn matches(&self, path: &str) -> bool {
        match self.match_kind {
            MatchKind::Exact => path == self.path,
            MatchKind::Prefix => {
                if self.path == "/" {
                    return true;
                }
                match path.strip_prefix(self.path.as_str()) {
                    Some(rest) => rest.is_empty() || rest.starts_with('/'),
                    None => false,
                }
            }
        }
    }

    fn specificity(&self, other: &Self) -> Ordering {
        other
            .path
            .len()
            .cmp(&self.path.len())
            .then_with(|| match (self.match_kind, other.match_kind) {
                (MatchKind::Exact, MatchKind::Prefix) => Ordering::Less,
                (MatchKind::Prefix, MatchKind::Exact) => Ordering::Greater,
                _ => Ordering::Equal,
            })
    }
}

/// Ordered set of protected routes, most specific first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedPathTable {
    rules: Vec<ProtectedPathRule>,
}

impl ProtectedPathTable {
    pub fn new(mut rules: Vec<ProtectedPathRule>) -> Result<Self, RuleError> {
        for rule in &rules {
            rule.validate()?;
        }
        rules.sort_by(|a, b| a.specificity(b));
        for pair in rules.windows(2) {
            if pair[0].path == pair[1].path && pair[0].match_kind == pair[1].match_kind {
                return Err(RuleError::Duplicate {
                    path: pair[0].path.clone(),
                    kind: pair[0].match_kind,
                });
            }
        }

        let table = Self { rules };
        // Every role must be able to reach its own dashboard, otherwise role
        // redirects would bounce.
        for role in Role::ALL {
            if let Some(rule) = table.find(role.home_path()) {
                if let Some(required) = rule.required_role {
                    if required != role {
                        return Err(RuleError::HomeUnreachable {
                            path: rule.path.clone(),
                            required,
                            role,
                        });
                    }
                }
            }
        }
        Ok(table)
    }

    /// Marketplace defaults: role dashboards plus an authenticated-only
    /// catch-all under `/dashboard`.
    pub fn default_rules() -> Vec<ProtectedPathRule> {
        vec![
            ProtectedPathRule {
                path: ADMIN_DASHBOARD.to_string(),
                match_kind: MatchKind::Prefix,
                required_role: Some(Role::Admin),
            },
            ProtectedPathRule {
                path: INSTRUCTOR_DASHBOARD.to_string(),
                match_kind: MatchKind::Prefix,
                required_role: Some(Role::Instructor),
            },
            ProtectedPathRule {
                path: GENERIC_DASHBOARD.to_string(),
                match_kind: MatchKind::Exact,
                required_role: Some(Role::Student),
            },
            ProtectedPathRule {
                path: GENERIC_DASHBOARD.to_string(),
                match_kind: MatchKind::Prefix,
                required_role: None,
            },
        ]
    }

    /// Most specific rule covering an already-normalized path.
    pub fn find(&self, path: &str) -> Option<&ProtectedPathRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn rules(&self) -> &[ProtectedPathRule] {
        &self.rules
    }
}

impl Default for ProtectedPathTable {
    fn default() -> Self {
        let mut rules = Self::default_rules();
        rules.sort_by(|a, b| a.specificity(b));
        Self { rules }
    }
}

/// What to do when a visitor with an unknown role lands on the generic
/// dashboard, where a role-home redirect would point back at itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownRolePolicy {
    /// Serve the generic dashboard (least privileged page).
    #[default]
    Allow,
    /// Send the visitor back to sign-in.
    SignIn,
}

/// What is known about the visitor once the session has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visitor {
    Anonymous,
    Authenticated { role: RoleResolution },
}

impl Visitor {
    pub fn with_role(role: Role) -> Self {
        Visitor::Authenticated {
            role: RoleResolution::Known(role),
        }
    }

    pub fn unknown_role() -> Self {
        Visitor::Authenticated {
            role: RoleResolution::Unknown,
        }
    }
}

/// Per-request routing outcome consumed by the serving layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    Allow,
    RedirectToSignIn,
    RedirectToRoleHome(RoleResolution),
}

impl RoutingDecision {
    /// Redirect location, or `None` when the request should proceed.
    pub fn redirect_target<'a>(&self, sign_in_path: &'a str) -> Option<&'a str> {
        match self {
            RoutingDecision::Allow => None,
            RoutingDecision::RedirectToSignIn => Some(sign_in_path),
            RoutingDecision::RedirectToRoleHome(role) => Some(role.home_path()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoutingDecision::Allow => "allow",
            RoutingDecision::RedirectToSignIn => "redirect_to_sign_in",
            RoutingDecision::RedirectToRoleHome(_) => "redirect_to_role_home",
        }
    }
}

/// Route access policy: a rule table plus the unknown-role decision.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    table: ProtectedPathTable,
    unknown_role: UnknownRolePolicy,
}

impl AccessPolicy {
    pub fn new(table: ProtectedPathTable, unknown_role: UnknownRolePolicy) -> Self {
        Self {
            table,
            unknown_role,
        }
    }

    pub fn table(&self) -> &ProtectedPathTable {
        &self.table
    }

    /// Rule protecting `path`, if any. Public paths return `None`.
    pub fn protecting_rule(&self, path: &str) -> Option<&ProtectedPathRule> {
        self.table.find(&normalize_path(path))
    }

    pub fn evaluate(&self, path: &str, visitor: &Visitor) -> RoutingDecision {
        let path = normalize_path(path);
        let Some(rule) = self.table.find(&path) else {
            return RoutingDecision::Allow;
        };

        let role = match visitor {
            Visitor::Anonymous => return RoutingDecision::RedirectToSignIn,
            Visitor::Authenticated { role } => *role,
        };

        let Some(required) = rule.required_role else {
            return RoutingDecision::Allow;
        };
        if role == RoleResolution::Known(required) {
            return RoutingDecision::Allow;
        }

        if role.home_path() != path {
            return RoutingDecision::RedirectToRoleHome(role);
        }

        match (role, self.unknown_role) {
            (RoleResolution::Unknown, UnknownRolePolicy::Allow) => RoutingDecision::Allow,
            (RoleResolution::Unknown, UnknownRolePolicy::SignIn) => RoutingDecision::RedirectToSignIn,
            // Unreachable with a validated table: a role's own home never
            // demands a different role.
            (RoleResolution::Known(_), _) => RoutingDecision::RedirectToSignIn,
        }
    }
}

/// File name the static file layer serves for a directory request.
const INDEX_PAGE: &str = "index.html";

/// Canonical form of a request path for rule matching.
///
/// Drops query and fragment, percent-decodes, collapses repeated slashes,
/// resolves `.` / `..` segments and strips the trailing slash. The static
/// file layer decodes paths the same way, so `/dashboard/%61dmin` and
/// `/dashboard//admin/` are both matched as `/dashboard/admin`.
///
/// A final `index.html` segment is dropped too: the file layer serves a
/// directory's index page under both names, so `/dashboard/index.html`
/// must be matched as `/dashboard`.
pub fn normalize_path(raw: &str) -> String {
    let raw = raw.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(raw).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    if segments.last() == Some(&INDEX_PAGE) {
        segments.pop();
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}
