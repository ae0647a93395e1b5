// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Edge access control for page routes.
//!
//! Every request passes through [`enforce_access`]. Asset and API paths are
//! bypassed; everything else is resolved against the credential provider and
//! either continues or is redirected. Access failures never produce an error
//! body.

use crate::config::AuthFailurePolicy;
use crate::middleware::auth::{session_cookie, SessionUser};
use crate::models::Role;
use crate::services::session::ResolvedSession;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

pub const LOGIN_PATH: &str = "/login";

const BYPASS_PREFIXES: &[&str] = &["/api", "/_next", "/static"];
const PUBLIC_PATHS: &[&str] = &["/login", "/forgot-password", "/reset-password", "/bootstrap"];

/// How a path is treated by the access middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// API, build assets, or files: never redirected.
    Bypass,
    Public,
    ProtectedAdmin,
    ProtectedMember,
    /// Any other authenticated page (e.g. the trainer dashboard).
    Protected,
}

/// Outcome of the access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Continue,
    Redirect(&'static str),
}

/// `path` equals `prefix` or is below it.
fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn classify_route(path: &str) -> RouteClass {
    if path.contains('.') || BYPASS_PREFIXES.iter().any(|p| is_under(path, p)) {
        return RouteClass::Bypass;
    }
    if path == "/" || PUBLIC_PATHS.iter().any(|p| is_under(path, p)) {
        return RouteClass::Public;
    }
    if is_under(path, "/admin") {
        return RouteClass::ProtectedAdmin;
    }
    if is_under(path, "/member") {
        return RouteClass::ProtectedMember;
    }
    RouteClass::Protected
}

/// Decide what to do with a non-bypassed request once the session is known.
pub fn decide(path: &str, user: Option<&SessionUser>) -> AccessDecision {
    let class = classify_route(path);
    if class == RouteClass::Bypass {
        return AccessDecision::Continue;
    }

    let Some(user) = user else {
        return match class {
            RouteClass::Public => AccessDecision::Continue,
            _ => AccessDecision::Redirect(LOGIN_PATH),
        };
    };

    if path == LOGIN_PATH {
        return AccessDecision::Redirect(user.role.dashboard_path());
    }

    match class {
        RouteClass::ProtectedAdmin if user.role != Role::Admin => {
            AccessDecision::Redirect(Role::Member.dashboard_path())
        }
        RouteClass::ProtectedMember if !matches!(user.role, Role::Member | Role::Admin) => {
            AccessDecision::Redirect(LOGIN_PATH)
        }
        _ => AccessDecision::Continue,
    }
}

/// Access middleware applied to the whole router.
pub async fn enforce_access(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if classify_route(&path) == RouteClass::Bypass {
        return next.run(request).await;
    }

    let lookup = tokio::time::timeout(
        state.config.auth_provider_timeout,
        state.credentials.current_user(request.headers()),
    )
    .await;

    let session: Option<ResolvedSession> = match lookup {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            tracing::error!(error = %e, path = %path, "Session resolution failed");
            match state.config.auth_failure_policy {
                AuthFailurePolicy::FailOpen => return next.run(request).await,
                AuthFailurePolicy::FailClosed => None,
            }
        }
        Err(_) => {
            tracing::error!(
                path = %path,
                timeout_ms = state.config.auth_provider_timeout.as_millis() as u64,
                "Session resolution timed out"
            );
            match state.config.auth_failure_policy {
                AuthFailurePolicy::FailOpen => return next.run(request).await,
                AuthFailurePolicy::FailClosed => None,
            }
        }
    };

    let (user, refreshed_token) = match session {
        Some(s) => (Some(s.user), s.refreshed_token),
        None => (None, None),
    };

    let mut response = match decide(&path, user.as_ref()) {
        AccessDecision::Continue => {
            if let Some(user) = user {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        AccessDecision::Redirect(target) => {
            tracing::debug!(
                path = %path,
                redirect_to = target,
                user_id = ?user.as_ref().map(|u| &u.user_id),
                "Redirecting request"
            );
            Redirect::temporary(target).into_response()
        }
    };

    if let Some(token) = refreshed_token {
        let secure = state.config.frontend_url.starts_with("https://");
        let cookie = session_cookie(token, state.credentials.session_ttl(), secure);
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Refreshed session cookie not representable"),
        }
    }

    response
}
