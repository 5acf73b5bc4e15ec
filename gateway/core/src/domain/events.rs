// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::RoleResolution;
use super::session::UserId;

/// Why a visitor's role could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleLookupFailure {
    ProfileMissing,
    StoreUnavailable,
    MalformedRole,
    TimedOut,
}

/// Audit trail of access decisions, one per protected request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AccessEvent {
    AccessGranted {
        path: String,
        user_id: UserId,
        role: RoleResolution,
        decided_at: DateTime<Utc>,
    },
    SignInRequired {
        path: String,
        /// Set when the auth provider failed and the request was failed closed.
        provider_error: Option<String>,
        decided_at: DateTime<Utc>,
    },
    RoleMismatchRedirected {
        path: String,
        user_id: UserId,
        role: RoleResolution,
        location: String,
        decided_at: DateTime<Utc>,
    },
    RoleLookupDegraded {
        path: String,
        user_id: UserId,
        failure: RoleLookupFailure,
        occurred_at: DateTime<Utc>,
    },
}
