// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # LearnHub Gateway Core
//!
//! Route access control for the LearnHub course marketplace: decides, per
//! request, whether a page may be served, whether the visitor must sign in,
//! or whether they belong on a different role dashboard.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain policy, application orchestration, adapters, HTTP middleware

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
