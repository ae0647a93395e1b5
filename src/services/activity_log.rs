// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Best-effort audit trail.
//!
//! Writes never fail outward and reads degrade to an empty list; the audit
//! trail is not a correctness guarantee.

use crate::db::FirestoreDb;
use crate::middleware::auth::SessionUser;
use crate::models::{ActivityAction, ActivityDetails, ActivityLogEntry, RecentActivity};
use crate::time_utils::format_utc_rfc3339_millis;
use futures_util::future::join_all;
use std::collections::HashMap;

const UNKNOWN_USER_NAME: &str = "Unknown user";

/// Appends and reads activity log entries.
#[derive(Clone)]
pub struct ActivityLogger {
    db: FirestoreDb,
}

impl ActivityLogger {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Build the entry that `log_activity` would store.
    pub fn build_entry(
        actor: &SessionUser,
        action: ActivityAction,
        target_id: &str,
        details: ActivityDetails,
    ) -> ActivityLogEntry {
        ActivityLogEntry {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: actor.user_id.clone(),
            action,
            target_type: action.target_type().to_string(),
            target_id: target_id.to_string(),
            details,
            created_at: format_utc_rfc3339_millis(chrono::Utc::now()),
        }
    }

    /// Record an action. Returns whether an entry was written.
    ///
    /// Without an authenticated actor this is a silent no-op. Storage
    /// failures are logged and swallowed.
    pub async fn log_activity(
        &self,
        actor: Option<&SessionUser>,
        action: ActivityAction,
        target_id: &str,
        details: ActivityDetails,
    ) -> bool {
        let Some(actor) = actor else {
            tracing::debug!(?action, target_id, "No authenticated user, skipping activity log");
            return false;
        };

        let entry = Self::build_entry(actor, action, target_id, details);

        match self.db.insert_activity_log(&entry).await {
            Ok(()) => {
                tracing::debug!(
                    entry_id = %entry.id,
                    user_id = %entry.user_id,
                    ?action,
                    "Activity logged"
                );
                true
            }
            Err(e) => {
                tracing::error!(error = %e, ?action, target_id, "Failed to write activity log");
                false
            }
        }
    }

    /// Fire-and-forget variant of [`log_activity`](Self::log_activity).
    pub fn spawn_log(
        &self,
        actor: Option<SessionUser>,
        action: ActivityAction,
        target_id: String,
        details: ActivityDetails,
    ) {
        let logger = self.clone();
        tokio::spawn(async move {
            logger
                .log_activity(actor.as_ref(), action, &target_id, details)
                .await;
        });
    }

    /// The `limit` most recent entries, newest first, with the acting user's
    /// display name. Empty on any failure.
    pub async fn get_recent_activity(&self, limit: u32) -> Vec<RecentActivity> {
        let entries = match self.db.recent_activity_logs(limit).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read recent activity");
                return Vec::new();
            }
        };

        let mut user_ids: Vec<&str> = entries.iter().map(|e| e.user_id.as_str()).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let lookups = join_all(user_ids.iter().map(|id| self.db.get_profile(id))).await;

        let mut names: HashMap<String, String> = HashMap::new();
        for (id, result) in user_ids.iter().zip(lookups) {
            match result {
                Ok(Some(profile)) => {
                    names.insert(id.to_string(), profile.full_name);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, user_id = id, "Failed to load profile for activity");
                }
            }
        }

        entries
            .into_iter()
            .map(|entry| {
                let name = names
                    .get(&entry.user_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_USER_NAME.to_string());
                RecentActivity::from_entry(entry, name)
            })
            .collect()
    }
}
