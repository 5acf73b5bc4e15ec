// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod access_control;

pub use access_control::{AccessControlService, StandardAccessControlService};
