// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Supabase Adapters
//!
//! Auth provider and profile store backed by a hosted Supabase project.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Resolve sessions and roles over the Supabase HTTP APIs
//! - **Integration:** Request credentials → GoTrue `/auth/v1/user` → PostgREST `/rest/v1/{table}`
//!
//! The profile query is issued with the visitor's own access token so the
//! project's row-level security applies to it.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::domain::gateway_config::SupabaseConfig;
use crate::domain::repository::{
    ProfileLookupError, ProfileStore, SessionLookupError, SessionProvider,
};
use crate::domain::role::Role;
use crate::domain::session::{Session, SessionCredentials, UserId};

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    role: Option<String>,
}

/// Client for one Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    profile_table: String,
    client: Client,
}

impl SupabaseClient {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        profile_table: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            profile_table: profile_table.into(),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let anon_key = config.resolve_anon_key()?;
        Ok(Self::new(&config.url, anon_key, &config.profile_table))
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }

    fn profile_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.profile_table)
    }
}

#[async_trait]
impl SessionProvider for SupabaseClient {
    async fn get_session(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Option<Session>, SessionLookupError> {
        let Some(token) = &credentials.token else {
            return Ok(None);
        };

        let response = self
            .client
            .get(self.user_url())
            .header("apikey", &self.anon_key)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| SessionLookupError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!("Auth provider rejected access token ({})", status);
            return Ok(None);
        }
        if status.is_server_error() {
            return Err(SessionLookupError::Unavailable(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(SessionLookupError::InvalidResponse(format!("HTTP {}", status)));
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| SessionLookupError::InvalidResponse(e.to_string()))?;
        if user.id.is_empty() {
            return Err(SessionLookupError::InvalidResponse("empty user id".to_string()));
        }

        Ok(Some(Session::new(UserId::new(user.id), token.clone())))
    }
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn get_role(&self, session: &Session) -> Result<Option<Role>, ProfileLookupError> {
        let id_filter = format!("eq.{}", session.user_id);
        let response = self
            .client
            .get(self.profile_url())
            .query(&[("id", id_filter.as_str()), ("select", "role")])
            .header("apikey", &self.anon_key)
            .bearer_auth(session.access_token.expose())
            .send()
            .await
            .map_err(|e| ProfileLookupError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ProfileLookupError::Unavailable(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(ProfileLookupError::InvalidResponse(format!("HTTP {}", status)));
        }

        let rows: Vec<ProfileRow> = response
            .json()
            .await
            .map_err(|e| ProfileLookupError::InvalidResponse(e.to_string()))?;

        let Some(raw) = rows.into_iter().next().and_then(|row| row.role) else {
            return Ok(None);
        };
        raw.parse::<Role>()
            .map(Some)
            .map_err(|_| ProfileLookupError::MalformedRole {
                user_id: session.user_id.clone(),
                raw,
            })
    }
}
