// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential provider: resolves the current user from a request.
//!
//! Role claims are trusted as carried in the token. A role changed in the
//! datastore reaches the session only when the identity provider issues a new
//! token, and tokens are only refreshed here while the original sign-in is
//! younger than `max_session_age`. That bounds role staleness to
//! `max_session_age + session_ttl` without a datastore read per request.

use crate::config::Config;
use crate::middleware::auth::{encode_claims, extract_token, unix_now, Claims, SessionUser};
use async_trait::async_trait;
use axum::http::HeaderMap;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::time::Duration;

/// Credential provider failures. Invalid or expired tokens are not errors;
/// they resolve to an anonymous request.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Credential provider unavailable: {0}")]
    Unavailable(String),

    #[error("Session refresh failed: {0}")]
    Refresh(String),
}

/// Result of resolving a request's session.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub user: SessionUser,
    /// Re-signed token the client should store in place of the old one.
    pub refreshed_token: Option<String>,
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Resolve the user behind `headers`, or `None` for an anonymous request.
    async fn current_user(&self, headers: &HeaderMap)
        -> Result<Option<ResolvedSession>, ProviderError>;

    /// Lifetime of tokens handed back in `ResolvedSession::refreshed_token`.
    fn session_ttl(&self) -> Duration;
}

/// Verifies HS256 session tokens and re-signs those close to expiry.
pub struct JwtSessionProvider {
    signing_key: Vec<u8>,
    ttl: Duration,
    refresh_threshold: Duration,
    max_session_age: Duration,
}

impl JwtSessionProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            signing_key: config.jwt_signing_key.clone(),
            ttl: config.session_ttl,
            refresh_threshold: config.session_refresh_threshold,
            max_session_age: config.max_session_age,
        }
    }

    /// Re-sign `claims` with a fresh expiry if they are close to expiring and
    /// the session is still within its maximum age.
    fn maybe_refresh(&self, claims: &Claims, now: usize) -> Result<Option<String>, ProviderError> {
        let remaining = claims.exp.saturating_sub(now);
        if remaining >= self.refresh_threshold.as_secs() as usize {
            return Ok(None);
        }

        let age = now.saturating_sub(claims.signed_in_at());
        if age > self.max_session_age.as_secs() as usize {
            tracing::debug!(
                user_id = %claims.sub,
                age_secs = age,
                "Session past maximum age, not refreshing"
            );
            return Ok(None);
        }

        let refreshed = Claims {
            iat: now,
            exp: now + self.ttl.as_secs() as usize,
            auth_time: claims.signed_in_at(),
            ..claims.clone()
        };

        encode_claims(&refreshed, &self.signing_key)
            .map(Some)
            .map_err(|e| ProviderError::Refresh(e.to_string()))
    }
}

#[async_trait]
impl CredentialProvider for JwtSessionProvider {
    async fn current_user(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<ResolvedSession>, ProviderError> {
        let Some(token) = extract_token(headers) else {
            return Ok(None);
        };

        let key = DecodingKey::from_secret(&self.signing_key);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = match decode::<Claims>(&token, &key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "Rejected session token");
                return Ok(None);
            }
        };

        // An expired session must never be revived by a refresh
        let now = unix_now();
        if claims.exp <= now {
            tracing::debug!(user_id = %claims.sub, "Session token expired");
            return Ok(None);
        }

        let refreshed_token = self.maybe_refresh(&claims, now)?;

        Ok(Some(ResolvedSession {
            user: SessionUser::from_claims(&claims),
            refreshed_token,
        }))
    }

    fn session_ttl(&self) -> Duration {
        self.ttl
    }
}
