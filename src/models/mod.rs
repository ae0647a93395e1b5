// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity_log;
pub mod profile;
pub mod role;

pub use activity_log::{ActivityAction, ActivityDetails, ActivityLogEntry, RecentActivity};
pub use profile::{DocumentRef, Profile};
pub use role::Role;
