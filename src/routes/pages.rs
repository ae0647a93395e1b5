// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page routes.
//!
//! These return the data each page renders. Access to them is decided
//! entirely by the access middleware; a handler only sees a user when the
//! middleware resolved one.

use crate::middleware::auth::SessionUser;
use crate::models::{RecentActivity, Role};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;

const DASHBOARD_ACTIVITY_LIMIT: u32 = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(|| public_page("home")))
        .route("/login", get(|| public_page("login")))
        .route("/forgot-password", get(|| public_page("forgot-password")))
        .route("/reset-password", get(|| public_page("reset-password")))
        .route("/bootstrap", get(|| public_page("bootstrap")))
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/member/dashboard", get(member_dashboard))
        .route("/trainer/dashboard", get(trainer_dashboard))
}

#[derive(Serialize)]
pub struct PublicPage {
    pub page: &'static str,
}

async fn public_page(page: &'static str) -> Json<PublicPage> {
    Json(PublicPage { page })
}

#[derive(Serialize)]
pub struct DashboardPage {
    pub page: &'static str,
    pub user_id: Option<String>,
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_activity: Option<Vec<RecentActivity>>,
}

fn dashboard(page: &'static str, user: Option<Extension<SessionUser>>) -> DashboardPage {
    let user = user.map(|Extension(u)| u);
    DashboardPage {
        page,
        user_id: user.as_ref().map(|u| u.user_id.clone()),
        role: user.map(|u| u.role),
        recent_activity: None,
    }
}

async fn admin_dashboard(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<SessionUser>>,
) -> Json<DashboardPage> {
    let mut page = dashboard("admin-dashboard", user);
    // A request let through without a session never sees the audit feed
    if page.role == Some(Role::Admin) {
        page.recent_activity = Some(
            state
                .activity_log
                .get_recent_activity(DASHBOARD_ACTIVITY_LIMIT)
                .await,
        );
    }
    Json(page)
}

async fn member_dashboard(user: Option<Extension<SessionUser>>) -> Json<DashboardPage> {
    Json(dashboard("member-dashboard", user))
}

async fn trainer_dashboard(user: Option<Extension<SessionUser>>) -> Json<DashboardPage> {
    Json(dashboard("trainer-dashboard", user))
}
