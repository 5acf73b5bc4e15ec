// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0
//! In-memory auth provider and profile store for local runs and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::repository::{
    ProfileLookupError, ProfileStore, SessionLookupError, SessionProvider,
};
use crate::domain::role::Role;
use crate::domain::session::{Session, SessionCredentials, SessionToken, UserId};

/// Token-to-user table standing in for the hosted auth provider.
#[derive(Clone, Default)]
pub struct InMemorySessionProvider {
    sessions: Arc<RwLock<HashMap<String, UserId>>>,
}

impl InMemorySessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sign_in(&self, token: impl Into<String>, user_id: UserId) {
        self.sessions.write().await.insert(token.into(), user_id);
    }

    /// Returns whether a session existed.
    pub async fn sign_out(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}

#[async_trait]
impl SessionProvider for InMemorySessionProvider {
    async fn get_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<Session>, SessionLookupError> {
        let Some(token) = &credentials.token else {
            return Ok(None);
        };
        let guard = self.sessions.read().await;
        Ok(guard
            .get(token.expose())
            .map(|user_id| Session::new(user_id.clone(), SessionToken::new(token.expose()))))
    }
}

/// Profile table keyed by user id. Roles are stored raw so that rows with
/// unrecognised roles can be represented.
#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<UserId, String>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_role(&self, user_id: UserId, role: Role) {
        self.set_raw_role(user_id, role.as_str()).await;
    }

    pub async fn set_raw_role(&self, user_id: UserId, raw: impl Into<String>) {
        self.profiles.write().await.insert(user_id, raw.into());
    }

    pub async fn remove(&self, user_id: &UserId) {
        self.profiles.write().await.remove(user_id);
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_role(&self, session: &Session) -> Result<Option<Role>, ProfileLookupError> {
        let guard = self.profiles.read().await;
        match guard.get(&session.user_id) {
            None => Ok(None),
            Some(raw) => raw.parse::<Role>().map(Some).map_err(|_| {
                ProfileLookupError::MalformedRole {
                    user_id: session.user_id.clone(),
                    raw: raw.clone(),
                }
            }),
        }
    }
}
