// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Access Control Application Service
//!
//! Resolves who is asking, then asks the pure [`AccessPolicy`] what to do.
//!
//! ## Per-request pipeline
//!
//! ```text
//! (path, credentials)
//!   └─ AccessPolicy::protecting_rule(path)     ← public paths stop here
//!   └─ SessionProvider::get_session            ← bounded; failure = anonymous
//!   └─ ProfileStore::get_role                  ← bounded; failure = unknown role
//!   └─ AccessPolicy::evaluate(path, visitor)
//!   └─ EventBus::publish(AccessEvent)
//! ```
//!
//! Nothing is cached between requests: a role change in the profile store is
//! visible on the very next request.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::access_policy::{AccessPolicy, RoutingDecision, Visitor};
use crate::domain::events::{AccessEvent, RoleLookupFailure};
use crate::domain::repository::{ProfileLookupError, ProfileStore, SessionProvider};
use crate::domain::role::RoleResolution;
use crate::domain::session::{Session, SessionCredentials};
use crate::infrastructure::event_bus::EventBus;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

#[async_trait]
pub trait AccessControlService: Send + Sync {
    /// Decide how to route a request for `path`.
    async fn evaluate(&self, path: &str, credentials: &SessionCredentials) -> RoutingDecision;
}

enum SessionResolution {
    Anonymous,
    Authenticated(Session),
    /// The auth provider could not answer; treated as anonymous.
    FailedClosed(String),
}

pub struct StandardAccessControlService {
    policy: AccessPolicy,
    sessions: Arc<dyn SessionProvider>,
    profiles: Arc<dyn ProfileStore>,
    event_bus: EventBus,
    lookup_timeout: Duration,
}

impl StandardAccessControlService {
    pub fn new(
        policy: AccessPolicy,
        sessions: Arc<dyn SessionProvider>,
        profiles: Arc<dyn ProfileStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            policy,
            sessions,
            profiles,
            event_bus,
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_lookup_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    async fn resolve_session(&self, credentials: &SessionCredentials) -> SessionResolution {
        if credentials.token.is_none() {
            return SessionResolution::Anonymous;
        }
        match timeout(self.lookup_timeout, self.sessions.get_session(credentials)).await {
            Ok(Ok(Some(session))) => SessionResolution::Authenticated(session),
            Ok(Ok(None)) => SessionResolution::Anonymous,
            Ok(Err(e)) => {
                warn!("Session lookup failed, treating request as anonymous: {}", e);
                SessionResolution::FailedClosed(e.to_string())
            }
            Err(_) => {
                warn!(
                    "Session lookup timed out after {:?}, treating request as anonymous",
                    self.lookup_timeout
                );
                SessionResolution::FailedClosed(format!(
                    "timed out after {:?}",
                    self.lookup_timeout
                ))
            }
        }
    }

    async fn resolve_role(&self, path: &str, session: &Session) -> RoleResolution {
        let failure = match timeout(self.lookup_timeout, self.profiles.get_role(session)).await {
            Ok(Ok(Some(role))) => return RoleResolution::Known(role),
            Ok(Ok(None)) => {
                warn!("No profile for user {}, role unknown", session.user_id);
                RoleLookupFailure::ProfileMissing
            }
            Ok(Err(ProfileLookupError::MalformedRole { user_id, raw })) => {
                warn!("Ignoring unrecognised role '{}' for user {}", raw, user_id);
                RoleLookupFailure::MalformedRole
            }
            Ok(Err(e)) => {
                warn!("Profile lookup failed for user {}: {}", session.user_id, e);
                RoleLookupFailure::StoreUnavailable
            }
            Err(_) => {
                warn!(
                    "Profile lookup for user {} timed out after {:?}",
                    session.user_id, self.lookup_timeout
                );
                RoleLookupFailure::TimedOut
            }
        };

        self.event_bus.publish(AccessEvent::RoleLookupDegraded {
            path: path.to_string(),
            user_id: session.user_id.clone(),
            failure,
            occurred_at: Utc::now(),
        });
        RoleResolution::Unknown
    }
}

#[async_trait]
impl AccessControlService for StandardAccessControlService {
    async fn evaluate(&self, path: &str, credentials: &SessionCredentials) -> RoutingDecision {
        if self.policy.protecting_rule(path).is_none() {
            return RoutingDecision::Allow;
        }

        let session = match self.resolve_session(credentials).await {
            SessionResolution::Authenticated(session) => session,
            other => {
                let provider_error = match other {
                    SessionResolution::FailedClosed(reason) => Some(reason),
                    _ => None,
                };
                debug!("Anonymous request for protected path {}", path);
                self.event_bus.publish(AccessEvent::SignInRequired {
                    path: path.to_string(),
                    provider_error,
                    decided_at: Utc::now(),
                });
                return self.policy.evaluate(path, &Visitor::Anonymous);
            }
        };

        let role = self.resolve_role(path, &session).await;
        let decision = self.policy.evaluate(path, &Visitor::Authenticated { role });

        let event = match decision {
            RoutingDecision::Allow => AccessEvent::AccessGranted {
                path: path.to_string(),
                user_id: session.user_id.clone(),
                role,
                decided_at: Utc::now(),
            },
            RoutingDecision::RedirectToRoleHome(home) => {
                info!(
                    "User {} ({}) redirected from {} to {}",
                    session.user_id,
                    role,
                    path,
                    home.home_path()
                );
                AccessEvent::RoleMismatchRedirected {
                    path: path.to_string(),
                    user_id: session.user_id.clone(),
                    role,
                    location: home.home_path().to_string(),
                    decided_at: Utc::now(),
                }
            }
            RoutingDecision::RedirectToSignIn => AccessEvent::SignInRequired {
                path: path.to_string(),
                provider_error: None,
                decided_at: Utc::now(),
            },
        };
        self.event_bus.publish(event);

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::SessionLookupError;
    use crate::domain::role::Role;
    use crate::domain::session::{SessionToken, UserId};
    use crate::infrastructure::repositories::{InMemoryProfileStore, InMemorySessionProvider};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSessions {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SessionProvider for CountingSessions {
        async fn get_session(
            &self,
            _credentials: &SessionCredentials,
        ) -> Result<Option<Session>, SessionLookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Session::new(UserId::new("u-1"), SessionToken::new("t"))))
        }
    }

    #[tokio::test]
    async fn test_public_path_skips_session_lookup() {
        let sessions = Arc::new(CountingSessions {
            calls: AtomicUsize::new(0),
        });
        let service = StandardAccessControlService::new(
            AccessPolicy::default(),
            sessions.clone(),
            Arc::new(InMemoryProfileStore::new()),
            EventBus::new(8),
        );

        let decision = service
            .evaluate("/courses", &SessionCredentials::bearer("t"))
            .await;
        assert_eq!(decision, RoutingDecision::Allow);
        assert_eq!(sessions.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_profile_publishes_degraded_event() {
        let sessions = InMemorySessionProvider::new();
        sessions.sign_in("t", UserId::new("u-1")).await;
        let bus = EventBus::new(8);
        let mut receiver = bus.subscribe();
        let service = StandardAccessControlService::new(
            AccessPolicy::default(),
            Arc::new(sessions),
            Arc::new(InMemoryProfileStore::new()),
            bus,
        );

        let decision = service
            .evaluate("/dashboard/admin", &SessionCredentials::bearer("t"))
            .await;
        assert_eq!(decision, RoutingDecision::RedirectToRoleHome(RoleResolution::Unknown));

        match receiver.recv().await.unwrap() {
            AccessEvent::RoleLookupDegraded { failure, .. } => {
                assert_eq!(failure, RoleLookupFailure::ProfileMissing)
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(
            receiver.recv().await.unwrap(),
            AccessEvent::RoleMismatchRedirected { .. }
        ));
    }

    #[tokio::test]
    async fn test_role_change_is_seen_immediately() {
        let sessions = InMemorySessionProvider::new();
        sessions.sign_in("t", UserId::new("u-1")).await;
        let profiles = InMemoryProfileStore::new();
        profiles.set_role(UserId::new("u-1"), Role::Student).await;

        let service = StandardAccessControlService::new(
            AccessPolicy::default(),
            Arc::new(sessions),
            Arc::new(profiles.clone()),
            EventBus::new(8),
        );
        let credentials = SessionCredentials::bearer("t");

        assert_eq!(
            service.evaluate("/dashboard/instructor", &credentials).await,
            RoutingDecision::RedirectToRoleHome(RoleResolution::Known(Role::Student))
        );

        profiles.set_role(UserId::new("u-1"), Role::Instructor).await;
        assert_eq!(
            service.evaluate("/dashboard/instructor", &credentials).await,
            RoutingDecision::Allow
        );
    }
}
