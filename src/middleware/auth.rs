// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session claims, role resolution, and per-route API authentication.

use crate::models::Role;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "gym_session";

/// Role metadata block inside the session token.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct RoleMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// JWT claims structure issued by the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (identity provider user ID)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Metadata the user supplied at sign-up
    #[serde(default)]
    pub user_metadata: RoleMetadata,
    /// Metadata assigned server-side
    #[serde(default)]
    pub app_metadata: RoleMetadata,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Original sign-in time; preserved across refreshes (0 means `iat`)
    #[serde(default)]
    pub auth_time: usize,
}

impl Claims {
    pub fn signed_in_at(&self) -> usize {
        if self.auth_time == 0 {
            self.iat
        } else {
            self.auth_time
        }
    }
}

/// Authenticated user resolved from session claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub email: Option<String>,
    pub role: Role,
}

impl SessionUser {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            email: claims.email.clone(),
            role: resolve_role(claims),
        }
    }
}

/// Map claims to a role.
///
/// User-supplied metadata wins over server-assigned metadata; an
/// authenticated user with neither is a member.
pub fn resolve_role(claims: &Claims) -> Role {
    let assigned = |meta: &RoleMetadata| {
        meta.role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(Role::parse)
    };

    assigned(&claims.user_metadata)
        .or_else(|| assigned(&claims.app_metadata))
        .unwrap_or(Role::Member)
}

/// Pull the session token from the cookie, falling back to a bearer header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub(crate) fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or(0)
}

/// Sign claims into a session token.
pub fn encode_claims(claims: &Claims, signing_key: &[u8]) -> anyhow::Result<String> {
    Ok(encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Create a session token with a server-assigned role.
pub fn issue_session_token(
    user_id: &str,
    email: Option<&str>,
    role: Role,
    signing_key: &[u8],
    ttl: Duration,
) -> anyhow::Result<String> {
    let now = unix_now();

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        user_metadata: RoleMetadata::default(),
        app_metadata: RoleMetadata {
            role: Some(role.as_str().to_string()),
        },
        iat: now,
        exp: now + ttl.as_secs() as usize,
        auth_time: now,
    };

    encode_claims(&claims, signing_key)
}

/// Session cookie carrying `token` for `ttl`.
pub fn session_cookie(token: String, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(ttl.as_secs() as i64))
        .build()
}

/// Cookie that clears the session on the client.
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Resolve the caller of an API route. Provider failures count as anonymous.
async fn resolve_api_user(state: &AppState, headers: &HeaderMap) -> Option<SessionUser> {
    let lookup = tokio::time::timeout(
        state.config.auth_provider_timeout,
        state.credentials.current_user(headers),
    )
    .await;

    match lookup {
        Ok(Ok(session)) => session.map(|s| s.user),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Session resolution failed for API request");
            None
        }
        Err(_) => {
            tracing::warn!("Session resolution timed out for API request");
            None
        }
    }
}

/// Attach the session user when present; never rejects.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user) = resolve_api_user(&state, request.headers()).await {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

/// Middleware that requires a valid session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = resolve_api_user(&state, request.headers())
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware that requires a valid session with the admin role.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = resolve_api_user(&state, request.headers())
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if user.role != Role::Admin {
        tracing::warn!(
            user_id = %user.user_id,
            role = %user.role,
            path = %request.uri().path(),
            "Blocked non-admin request to admin API"
        );
        return Err(StatusCode::FORBIDDEN);
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
