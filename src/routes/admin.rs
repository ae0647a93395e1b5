// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin provisioning routes: create users and profiles, delete users.
//!
//! All routes here sit behind `require_admin`.

use crate::error::{AppError, Result};
use crate::middleware::auth::SessionUser;
use crate::models::{ActivityAction, ActivityDetails, Profile, Role};
use crate::services::{run_cascade, IdentityAdmin, UserDeletion, USER_DELETION_STEPS};
use crate::time_utils::format_utc_rfc3339_millis;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/create-user", post(create_user))
        .route("/api/admin/create-profile", post(create_profile))
        .route("/api/admin/delete-user", post(delete_user))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "User ID is required"))]
    pub id: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "User ID is required"))]
    pub user_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreateUserResponse {
    pub success: bool,
    pub user_id: String,
}

#[derive(Serialize)]
pub struct CreateProfileResponse {
    pub success: bool,
    pub profile: Profile,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
    pub warnings: Vec<String>,
}

/// Flatten validator errors into one message, stable across runs.
fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .map(|e| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| e.code.to_string())
        })
        .collect();
    messages.sort();
    messages.dedup();
    messages.join("; ")
}

/// Unwrap a JSON body, reporting malformed input in the standard error shape.
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn check<T: Validate>(request: &T) -> Result<()> {
    request
        .validate()
        .map_err(|e| AppError::BadRequest(validation_message(&e)))
}

fn identity_admin(state: &AppState) -> Result<&IdentityAdmin> {
    state
        .identity
        .as_ref()
        .ok_or_else(|| AppError::Configuration("service role key is not configured".to_string()))
}

/// Absent role means member; anything else must be a known role.
fn requested_role(raw: Option<&str>) -> Result<Role> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(Role::Member),
        Some(raw) => match Role::parse(raw) {
            Role::Unknown => Err(AppError::BadRequest(format!("Invalid role: {}", raw))),
            role => Ok(role),
        },
    }
}

fn new_profile(id: &str, email: &str, full_name: &str, role: Role, phone: Option<String>) -> Profile {
    let now = format_utc_rfc3339_millis(chrono::Utc::now());
    Profile {
        id: id.to_string(),
        email: email.trim().to_string(),
        full_name: full_name.trim().to_string(),
        role,
        phone: phone.filter(|p| !p.trim().is_empty()),
        created_at: now.clone(),
        updated_at: now,
    }
}

/// POST /api/admin/create-user - provision an identity user and its profile.
async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<SessionUser>,
    payload: std::result::Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<CreateUserResponse>> {
    let identity = identity_admin(&state)?;
    let req = json_body(payload)?;
    check(&req)?;
    let role = requested_role(req.role.as_deref())?;

    let user_id = identity
        .create_user(req.email.trim(), &req.password, req.full_name.trim(), role)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let profile = new_profile(&user_id, &req.email, &req.full_name, role, None);
    if let Err(e) = state.db.upsert_profile(&profile).await {
        tracing::error!(error = %e, user_id = %user_id, "Identity user created but profile write failed");
        return Err(AppError::Upstream(format!("Failed to create profile: {}", e)));
    }

    state
        .activity_log
        .log_activity(
            Some(&admin),
            ActivityAction::UserCreated,
            &user_id,
            ActivityDetails::Account {
                email: profile.email.clone(),
                full_name: profile.full_name.clone(),
                role,
            },
        )
        .await;

    tracing::info!(user_id = %user_id, %role, admin_id = %admin.user_id, "User created");
    Ok(Json(CreateUserResponse {
        success: true,
        user_id,
    }))
}

/// POST /api/admin/create-profile - write a profile for an existing identity user.
async fn create_profile(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<SessionUser>,
    payload: std::result::Result<Json<CreateProfileRequest>, JsonRejection>,
) -> Result<Json<CreateProfileResponse>> {
    identity_admin(&state)?;
    let req = json_body(payload)?;
    check(&req)?;
    let role = requested_role(req.role.as_deref())?;

    let profile = new_profile(req.id.trim(), &req.email, &req.full_name, role, req.phone);
    state
        .db
        .upsert_profile(&profile)
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to create profile: {}", e)))?;

    state
        .activity_log
        .log_activity(
            Some(&admin),
            ActivityAction::ProfileCreated,
            &profile.id,
            ActivityDetails::Account {
                email: profile.email.clone(),
                full_name: profile.full_name.clone(),
                role,
            },
        )
        .await;

    tracing::info!(user_id = %profile.id, %role, admin_id = %admin.user_id, "Profile created");
    Ok(Json(CreateProfileResponse {
        success: true,
        profile,
    }))
}

/// POST /api/admin/delete-user - remove a user and everything that references them.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<SessionUser>,
    payload: std::result::Result<Json<DeleteUserRequest>, JsonRejection>,
) -> Result<Json<DeleteUserResponse>> {
    let identity = identity_admin(&state)?;
    let req = json_body(payload)?;
    check(&req)?;
    let user_id = req.user_id.trim();

    if user_id == admin.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let executor = UserDeletion {
        db: &state.db,
        identity,
    };
    let report = run_cascade(USER_DELETION_STEPS, user_id, &executor)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    state
        .activity_log
        .log_activity(
            Some(&admin),
            ActivityAction::UserDeleted,
            user_id,
            ActivityDetails::Deletion {
                warnings: report.warnings.clone(),
            },
        )
        .await;

    tracing::info!(
        user_id,
        admin_id = %admin.user_id,
        warnings = report.warnings.len(),
        "User deleted"
    );
    Ok(Json(DeleteUserResponse {
        success: true,
        message: "User deleted successfully".to_string(),
        warnings: report.warnings,
    }))
}
