// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Roles and Role Homes
//!
//! Every user profile carries exactly one [`Role`]. Each role owns a dashboard
//! ("role home"); the mapping from role to home path is a fixed table, so a
//! redirect target can never be assembled from an unvalidated string.
//!
//! | Resolution | Home |
//! |------------|------|
//! | `student` | `/dashboard` |
//! | `instructor` | `/dashboard/instructor` |
//! | `admin` | `/dashboard/admin` |
//! | unknown | `/dashboard` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Generic dashboard, also the safe destination for unknown roles.
pub const GENERIC_DASHBOARD: &str = "/dashboard";
pub const INSTRUCTOR_DASHBOARD: &str = "/dashboard/instructor";
pub const ADMIN_DASHBOARD: &str = "/dashboard/admin";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleParseError {
    #[error("Unrecognised role: '{0}'")]
    Unrecognised(String),
}

/// Marketplace role stored on the user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Instructor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }

    /// Dashboard this role lands on.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Student => GENERIC_DASHBOARD,
            Role::Instructor => INSTRUCTOR_DASHBOARD,
            Role::Admin => ADMIN_DASHBOARD,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    /// Accepts the exact lowercase profile-store spelling only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            "admin" => Ok(Role::Admin),
            _ => Err(RoleParseError::Unrecognised(s.to_string())),
        }
    }
}

/// Outcome of resolving a session's role for a single request.
///
/// `Unknown` covers a missing profile, a failed or timed-out lookup, and a
/// role string the gateway does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleResolution {
    Known(Role),
    Unknown,
}

impl RoleResolution {
    pub fn home_path(&self) -> &'static str {
        match self {
            RoleResolution::Known(role) => role.home_path(),
            RoleResolution::Unknown => GENERIC_DASHBOARD,
        }
    }
}

impl fmt::Display for RoleResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleResolution::Known(role) => write!(f, "{}", role),
            RoleResolution::Unknown => f.write_str("unknown"),
        }
    }
}
