// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider admin API client.
//!
//! Creating and deleting identity records needs the privileged service key.
//! Without it the client is not constructed and admin endpoints report a
//! configuration error.

use crate::config::Config;
use crate::models::Role;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider answered and refused the request.
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or answered nonsense.
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Created identity user.
#[derive(Debug, Deserialize)]
struct CreatedUser {
    id: String,
}

/// Error bodies vary between provider versions.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Admin API client for the identity provider.
#[derive(Clone)]
pub struct IdentityAdmin {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl IdentityAdmin {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    /// Build a client when the service key is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .service_role_key
            .as_deref()
            .map(|key| Self::new(&config.identity_admin_url, key))
    }

    /// Create a confirmed identity user and return its ID.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: Role,
    ) -> Result<String, IdentityError> {
        let url = format!("{}/users", self.base_url);

        let body = serde_json::json!({
            "email": email,
            "password": password,
            "email_confirm": true,
            "user_metadata": { "full_name": full_name, "role": role },
            "app_metadata": { "role": role },
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let response = check_response(response).await?;

        let created: CreatedUser = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("JSON parse error: {}", e)))?;

        tracing::info!(user_id = %created.id, %role, "Identity user created");
        Ok(created.id)
    }

    /// Delete an identity user.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), IdentityError> {
        let url = format!("{}/users/{}", self.base_url, urlencoding::encode(user_id));

        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        check_response(response).await?;

        tracing::info!(user_id, "Identity user deleted");
        Ok(())
    }
}

/// Turn non-2xx responses into errors carrying the provider's message.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ProviderErrorBody>(&text)
        .ok()
        .and_then(ProviderErrorBody::into_message)
        .unwrap_or_else(|| format!("HTTP {}: {}", status, text));

    if status.is_server_error() {
        Err(IdentityError::Unavailable(message))
    } else {
        Err(IdentityError::Rejected(message))
    }
}
