// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session and dashboard API routes.

use crate::middleware::auth::{removal_cookie, SessionUser};
use crate::models::{RecentActivity, Role};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_ACTIVITY_LIMIT: u32 = 20;
const MAX_ACTIVITY_LIMIT: u32 = 100;

/// Routes that require a signed-in user.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/me", get(get_me))
}

/// Routes that require an admin.
pub fn admin_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/activity/recent", get(get_recent_activity))
}

/// Routes open to everyone.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/auth/logout", post(logout))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Role,
    pub dashboard: String,
}

/// Who the session belongs to, as the session itself claims.
async fn get_me(Extension(user): Extension<SessionUser>) -> Json<MeResponse> {
    Json(MeResponse {
        dashboard: user.role.dashboard_path().to_string(),
        user_id: user.user_id,
        email: user.email,
        role: user.role,
    })
}

#[derive(Deserialize)]
pub struct RecentActivityQuery {
    pub limit: Option<u32>,
}

#[derive(Serialize)]
pub struct RecentActivityResponse {
    pub activities: Vec<RecentActivity>,
}

/// Clamp a requested page size to `1..=MAX_ACTIVITY_LIMIT`.
pub fn activity_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT)
}

async fn get_recent_activity(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentActivityQuery>,
) -> Json<RecentActivityResponse> {
    let activities = state
        .activity_log
        .get_recent_activity(activity_limit(query.limit))
        .await;
    Json(RecentActivityResponse { activities })
}

/// Drop the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (StatusCode, CookieJar) {
    let secure = state.config.frontend_url.starts_with("https://");
    (StatusCode::NO_CONTENT, jar.add(removal_cookie(secure)))
}
