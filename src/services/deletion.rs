// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ordered, best-effort user deletion.
//!
//! Dependent records go first, the identity record last. Optional steps may
//! fail without stopping the cascade; their errors are collected as
//! warnings. The first failing required step aborts.

use crate::db::{collections, FirestoreDb};
use crate::services::identity::IdentityAdmin;
use async_trait::async_trait;

/// One stage of the deletion cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStage {
    Notifications,
    ActivityLogs,
    Payments,
    SessionBookings,
    TrainerSessions,
    MemberRecord,
    Profile,
    IdentityUser,
}

impl DeletionStage {
    /// Human-readable name used in messages.
    pub fn label(self) -> &'static str {
        match self {
            DeletionStage::Notifications => "notifications",
            DeletionStage::ActivityLogs => "activity logs",
            DeletionStage::Payments => "payments",
            DeletionStage::SessionBookings => "session bookings",
            DeletionStage::TrainerSessions => "trainer sessions",
            DeletionStage::MemberRecord => "member record",
            DeletionStage::Profile => "profile",
            DeletionStage::IdentityUser => "auth user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeletionStep {
    pub stage: DeletionStage,
    pub required: bool,
}

const fn step(stage: DeletionStage, required: bool) -> DeletionStep {
    DeletionStep { stage, required }
}

/// Steps run for `POST /api/admin/delete-user`, in order.
pub const USER_DELETION_STEPS: &[DeletionStep] = &[
    step(DeletionStage::Notifications, false),
    step(DeletionStage::ActivityLogs, false),
    step(DeletionStage::Payments, false),
    step(DeletionStage::SessionBookings, false),
    step(DeletionStage::TrainerSessions, false),
    step(DeletionStage::MemberRecord, true),
    step(DeletionStage::Profile, true),
    step(DeletionStage::IdentityUser, true),
];

/// Outcome of a cascade that reached the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    /// Stages that succeeded with the number of records removed
    pub completed: Vec<(DeletionStage, usize)>,
    /// Failures of optional stages
    pub warnings: Vec<String>,
}

/// A required stage failed; later stages were not attempted.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to delete {}: {message}", .stage.label())]
pub struct DeletionError {
    pub stage: DeletionStage,
    pub message: String,
    /// Optional-stage failures seen before the abort
    pub warnings: Vec<String>,
}

/// Performs the work of a single stage.
#[async_trait]
pub trait StageExecutor: Send + Sync {
    /// Delete the stage's records for `user_id`, returning how many went.
    async fn execute(&self, stage: DeletionStage, user_id: &str) -> Result<usize, String>;
}

/// Run `steps` in order against `executor`.
pub async fn run_cascade(
    steps: &[DeletionStep],
    user_id: &str,
    executor: &dyn StageExecutor,
) -> Result<DeletionReport, DeletionError> {
    let mut report = DeletionReport::default();

    for step in steps {
        match executor.execute(step.stage, user_id).await {
            Ok(count) => {
                tracing::debug!(user_id, stage = step.stage.label(), count, "Deletion stage done");
                report.completed.push((step.stage, count));
            }
            Err(message) if step.required => {
                tracing::error!(
                    user_id,
                    stage = step.stage.label(),
                    error = %message,
                    "Required deletion stage failed, aborting"
                );
                return Err(DeletionError {
                    stage: step.stage,
                    message,
                    warnings: report.warnings,
                });
            }
            Err(message) => {
                tracing::warn!(
                    user_id,
                    stage = step.stage.label(),
                    error = %message,
                    "Optional deletion stage failed, continuing"
                );
                report
                    .warnings
                    .push(format!("{}: {}", step.stage.label(), message));
            }
        }
    }

    Ok(report)
}

/// Executes stages against Firestore and the identity provider.
pub struct UserDeletion<'a> {
    pub db: &'a FirestoreDb,
    pub identity: &'a IdentityAdmin,
}

#[async_trait]
impl<'a> StageExecutor for UserDeletion<'a> {
    async fn execute(&self, stage: DeletionStage, user_id: &str) -> Result<usize, String> {
        let result = match stage {
            DeletionStage::Notifications => {
                self.db
                    .delete_where(collections::NOTIFICATIONS, "user_id", user_id)
                    .await
            }
            DeletionStage::ActivityLogs => {
                self.db
                    .delete_where(collections::ACTIVITY_LOGS, "user_id", user_id)
                    .await
            }
            DeletionStage::Payments => {
                self.db
                    .delete_where(collections::PAYMENTS, "user_id", user_id)
                    .await
            }
            DeletionStage::SessionBookings => {
                self.db
                    .delete_where(collections::SESSION_BOOKINGS, "user_id", user_id)
                    .await
            }
            DeletionStage::TrainerSessions => {
                self.db
                    .delete_where(collections::TRAINER_SESSIONS, "trainer_id", user_id)
                    .await
            }
            DeletionStage::MemberRecord => {
                self.db
                    .delete_where(collections::MEMBERS, "user_id", user_id)
                    .await
            }
            DeletionStage::Profile => self
                .db
                .delete_document(collections::PROFILES, user_id)
                .await
                .map(|()| 1),
            DeletionStage::IdentityUser => {
                return self
                    .identity
                    .delete_user(user_id)
                    .await
                    .map(|()| 1)
                    .map_err(|e| e.to_string());
            }
        };

        result.map_err(|e| e.to_string())
    }
}
