// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`learnhub-gateway-core`)
//!
//! HTTP surface that turns routing decisions into responses. **No policy
//! lives here**; decisions come from `crate::application`.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`middleware`] | Credential extraction and the access-enforcing axum middleware |
//! | [`api`] | Router assembly and the health endpoint |

pub mod api;
pub mod middleware;

pub use api::router;
pub use middleware::{enforce_access, extract_credentials, AccessGuard};
