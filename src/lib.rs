// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Gym portal: role-gated dashboards, admin provisioning, and image uploads
//!
//! This crate provides the backend for the gym management app: the edge
//! access middleware, the upload pipeline, user provisioning and deletion,
//! and the activity log shown on the admin dashboard.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{ActivityLogger, BlobStore, CredentialProvider, IdentityAdmin, JwtSessionProvider, LocalDiskStore};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub credentials: Arc<dyn CredentialProvider>,
    pub activity_log: ActivityLogger,
    pub local_store: LocalDiskStore,
    /// Present when blob storage is configured
    pub blob_store: Option<BlobStore>,
    /// Present when the service role key is configured
    pub identity: Option<IdentityAdmin>,
}

impl AppState {
    /// Wire up the default services for `config` around an existing
    /// datastore handle.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let credentials: Arc<dyn CredentialProvider> = Arc::new(JwtSessionProvider::new(&config));
        let blob_store = match (&config.blob_base_url, &config.blob_token) {
            (Some(url), Some(token)) => Some(BlobStore::new(url, token)),
            _ => None,
        };

        Self {
            credentials,
            activity_log: ActivityLogger::new(db.clone()),
            local_store: LocalDiskStore::new(config.upload_dir.clone()),
            blob_store,
            identity: IdentityAdmin::from_config(&config),
            config,
            db,
        }
    }
}
