// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0
//! LearnHub gateway CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Command handlers and server wiring for the `learnhub` binary

pub mod commands;
pub mod server;
