// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: roles, sessions, the access policy and its configuration.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure routing rules and the contracts of external collaborators

pub mod role;
pub mod session;
pub mod access_policy;
pub mod repository;
pub mod events;
pub mod gateway_config;
