// Copyright (c) 2026 LearnHub Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod event_bus;
pub mod repositories;
pub mod supabase;

pub use repositories::{InMemoryProfileStore, InMemorySessionProvider};
pub use supabase::SupabaseClient;
