// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0
//! External collaborators consulted while resolving a visitor.
//!
//! Both are owned by the hosted backend; the gateway only reads from them.

use async_trait::async_trait;
use thiserror::Error;

use super::role::Role;
use super::session::{Session, SessionCredentials, UserId};

#[derive(Debug, Error)]
pub enum SessionLookupError {
    #[error("Auth provider unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected auth provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ProfileLookupError {
    #[error("Profile store unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected profile store response: {0}")]
    InvalidResponse(String),

    /// The stored role is not one the gateway understands.
    #[error("Profile for user {user_id} has unrecognised role '{raw}'")]
    MalformedRole { user_id: UserId, raw: String },
}

/// Auth provider: turns request credentials into a session.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `Ok(None)` when the credentials are absent, expired or rejected.
    async fn get_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<Session>, SessionLookupError>;
}

/// Profile store: maps a user to their single role.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when the user has no profile row.
    async fn get_role(&self, session: &Session) -> Result<Option<Role>, ProfileLookupError>;
}
