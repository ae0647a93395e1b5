// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Audit trail entries written by mutating operations.

use super::Role;
use serde::{Deserialize, Deserializer, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Action recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityAction {
    UserCreated,
    ProfileCreated,
    UserDeleted,
    FileUploaded,
    /// Written by a newer release; kept readable.
    #[serde(other)]
    Other,
}

impl ActivityAction {
    /// Kind of record the action targets.
    pub fn target_type(self) -> &'static str {
        match self {
            ActivityAction::UserCreated | ActivityAction::UserDeleted => "user",
            ActivityAction::ProfileCreated => "profile",
            ActivityAction::FileUploaded => "file",
            ActivityAction::Other => "unknown",
        }
    }
}

/// Per-action payload. Each action kind carries its own typed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityDetails {
    Account {
        email: String,
        full_name: String,
        role: Role,
    },
    Deletion {
        /// Non-fatal cleanup failures reported by the cascade
        warnings: Vec<String>,
    },
    Upload {
        file_name: String,
        original_name: String,
        section: String,
        field: String,
        size: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        testimonial_id: Option<String>,
    },
    #[serde(other)]
    #[default]
    Unspecified,
}

/// Accept any stored `details` value. Payloads without a recognised `kind`
/// (including null and free-form maps from other writers) read back as
/// `Unspecified` instead of failing the whole query.
fn lenient_details<'de, D>(deserializer: D) -> Result<ActivityDetails, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).unwrap_or_default())
}

/// Stored activity log record (append-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Random UUID (also used as document ID)
    pub id: String,
    /// Acting user
    pub user_id: String,
    pub action: ActivityAction,
    pub target_type: String,
    pub target_id: String,
    #[serde(default, deserialize_with = "lenient_details")]
    pub details: ActivityDetails,
    /// RFC3339 UTC with millisecond precision; sorts lexicographically
    pub created_at: String,
}

/// Activity log entry joined with the acting user's display name.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecentActivity {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub action: ActivityAction,
    pub target_type: String,
    pub target_id: String,
    pub details: ActivityDetails,
    pub created_at: String,
}

impl RecentActivity {
    pub fn from_entry(entry: ActivityLogEntry, user_name: String) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            user_name,
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id,
            details: entry.details,
            created_at: entry.created_at,
        }
    }
}
