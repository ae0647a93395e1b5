// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets (JWT signing key, service role key, blob token) are injected as
//! environment variables by the deployment and read once at startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// What the access middleware does when the credential provider fails or
/// times out while resolving the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailurePolicy {
    /// Let the request through unmodified (availability first).
    FailOpen,
    /// Treat the request as anonymous, so protected pages redirect to login.
    FailClosed,
}

impl FromStr for AuthFailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "open" => Ok(Self::FailOpen),
            "fail-closed" | "closed" => Ok(Self::FailClosed),
            _ => Err(ConfigError::Invalid("AUTH_FAILURE_POLICY", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Base URL of the identity provider's admin API
    pub identity_admin_url: String,
    /// Directory that local uploads are written to and served from
    pub upload_dir: PathBuf,
    /// Base URL of the blob storage API (blob uploads disabled when unset)
    pub blob_base_url: Option<String>,
    /// Behaviour when session resolution fails
    pub auth_failure_policy: AuthFailurePolicy,
    /// Upper bound on a single credential provider call
    pub auth_provider_timeout: Duration,
    /// Lifetime of a (re)issued session token
    pub session_ttl: Duration,
    /// Tokens closer than this to expiry are re-signed by the middleware
    pub session_refresh_threshold: Duration,
    /// Sessions older than this are never refreshed; bounds role staleness
    pub max_session_age: Duration,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Privileged key for the identity admin API
    pub service_role_key: Option<String>,
    /// Bearer token for the blob storage API
    pub blob_token: Option<String>,
}

impl Config {
    /// Config for tests: no external services configured.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            identity_admin_url: "http://127.0.0.1:9/admin".to_string(),
            upload_dir: env::temp_dir().join("gym-portal-test-uploads"),
            blob_base_url: None,
            auth_failure_policy: AuthFailurePolicy::FailOpen,
            auth_provider_timeout: Duration::from_secs(3),
            session_ttl: Duration::from_secs(3600),
            session_refresh_threshold: Duration::from_secs(900),
            max_session_age: Duration::from_secs(7 * 24 * 60 * 60),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            service_role_key: None,
            blob_token: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            identity_admin_url: env::var("IDENTITY_ADMIN_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:9999/admin".to_string()),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public/uploads")),
            blob_base_url: optional_var("BLOB_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string()),
            auth_failure_policy: match optional_var("AUTH_FAILURE_POLICY") {
                Some(raw) => raw.parse()?,
                None => AuthFailurePolicy::FailOpen,
            },
            auth_provider_timeout: Duration::from_millis(parse_var(
                "AUTH_PROVIDER_TIMEOUT_MS",
                3000,
            )?),
            session_ttl: Duration::from_secs(parse_var("SESSION_TTL_SECS", 3600)?),
            session_refresh_threshold: Duration::from_secs(parse_var(
                "SESSION_REFRESH_THRESHOLD_SECS",
                900,
            )?),
            max_session_age: Duration::from_secs(parse_var(
                "MAX_SESSION_AGE_SECS",
                7 * 24 * 60 * 60,
            )?),

            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            service_role_key: optional_var("SERVICE_ROLE_KEY"),
            blob_token: optional_var("BLOB_TOKEN"),
        })
    }
}

/// Read an env var, treating empty or whitespace-only values as unset.
fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name, raw)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
