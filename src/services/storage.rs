// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence strategies for validated uploads.
//!
//! - [`LocalDiskStore`]: writes under the uploads directory, served back by
//!   `/api/uploads/*`.
//! - [`BlobStore`]: pushes to a remote blob service over HTTP.

use async_trait::async_trait;
use axum::body::Bytes;
use serde::Deserialize;
use std::path::PathBuf;

/// Public path prefix that local uploads are served under.
pub const LOCAL_PUBLIC_PREFIX: &str = "/api/uploads";

/// Persistence failures. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("blob storage request failed: {0}")]
    Remote(String),
}

/// Where a stored asset can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicRef {
    /// Path relative to this server, e.g. `/api/uploads/x.jpg`
    LocalPath(String),
    /// Absolute URL on the blob service
    RemoteUrl(String),
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist `data` under `file_name` and return its public reference.
    async fn put(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<PublicRef, StorageError>;
}

/// Writes uploads to a local directory. Writes are not atomic: a failure
/// mid-write can leave a partial file behind.
#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map URL path segments to a file under the root.
    ///
    /// Returns `None` for any segment that could leave the root.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        let mut segments = 0;
        for segment in relative.split('/') {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains(['\\', '\0'])
            {
                return None;
            }
            path.push(segment);
            segments += 1;
        }
        (segments > 0).then_some(path)
    }
}

#[async_trait]
impl AssetStore for LocalDiskStore {
    async fn put(
        &self,
        file_name: &str,
        _content_type: &str,
        data: Bytes,
    ) -> Result<PublicRef, StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let path = self.root.join(file_name);
        tokio::fs::write(&path, &data).await?;

        tracing::debug!(path = %path.display(), size = data.len(), "Wrote upload to disk");

        Ok(PublicRef::LocalPath(format!(
            "{}/{}",
            LOCAL_PUBLIC_PREFIX, file_name
        )))
    }
}

/// Response body of the blob service's PUT endpoint.
#[derive(Debug, Deserialize)]
struct BlobPutResponse {
    url: String,
}

/// Uploads to a remote blob service: `PUT {base}/uploads/{file_name}`.
#[derive(Clone)]
pub struct BlobStore {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl BlobStore {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl AssetStore for BlobStore {
    async fn put(
        &self,
        file_name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<PublicRef, StorageError> {
        let url = format!(
            "{}/uploads/{}",
            self.base_url,
            urlencoding::encode(file_name)
        );

        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Remote(format!("HTTP {}: {}", status, body)));
        }

        let body: BlobPutResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Remote(format!("JSON parse error: {}", e)))?;

        tracing::debug!(url = %body.url, "Stored upload in blob storage");

        Ok(PublicRef::RemoteUrl(body.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_stays_under_root() {
        let store = LocalDiskStore::new("/srv/uploads");
        assert_eq!(
            store.resolve("a.jpg"),
            Some(PathBuf::from("/srv/uploads/a.jpg"))
        );
        assert_eq!(
            store.resolve("team/a.jpg"),
            Some(PathBuf::from("/srv/uploads/team/a.jpg"))
        );
        assert_eq!(store.resolve("../etc/passwd"), None);
        assert_eq!(store.resolve("team/../../x"), None);
        assert_eq!(store.resolve("./a.jpg"), None);
        assert_eq!(store.resolve(""), None);
        assert_eq!(store.resolve("a//b"), None);
        assert_eq!(store.resolve("..\\x"), None);
    }

    #[tokio::test]
    async fn test_local_put_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskStore::new(dir.path().join("nested/uploads"));

        let public = store
            .put("gallery-main-1.png", "image/png", Bytes::from_static(b"png"))
            .await
            .unwrap();

        assert_eq!(
            public,
            PublicRef::LocalPath("/api/uploads/gallery-main-1.png".to_string())
        );
        let written = std::fs::read(dir.path().join("nested/uploads/gallery-main-1.png")).unwrap();
        assert_eq!(written, b"png");
    }
}
