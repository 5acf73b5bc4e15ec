// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access token presented by the browser. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Credentials pulled off an incoming request, before the auth provider has
/// vouched for them.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    pub token: Option<SessionToken>,
}

impl SessionCredentials {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(SessionToken::new(token)),
        }
    }
}

/// Authenticated session as reported by the auth provider.
///
/// Read-only from the gateway's perspective: it is looked up per request and
/// dropped with it.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
    pub access_token: SessionToken,
}

impl Session {
    pub fn new(user_id: UserId, access_token: SessionToken) -> Self {
        Self {
            user_id,
            access_token,
        }
    }
}
