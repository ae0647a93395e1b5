// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image upload and retrieval routes.

use crate::middleware::auth::SessionUser;
use crate::models::{ActivityAction, ActivityDetails};
use crate::services::storage::AssetStore;
use crate::services::upload::{
    process_upload, IncomingFile, StoredAsset, UploadError, UploadRequest, MAX_UPLOAD_BYTES,
};
use crate::services::PublicRef;
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use axum::extract::multipart::MultipartRejection;
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Transport cap for upload bodies: the file limit plus room for the other
/// form fields and multipart framing.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// Upload routes. Callers are identified when possible but not required.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/upload", post(upload_local))
        .route("/api/upload/blob", post(upload_blob))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Public retrieval of locally stored uploads.
pub fn asset_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/uploads/{*path}", get(serve_upload))
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_url: Option<String>,
    pub file_name: String,
    pub original_name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl From<StoredAsset> for UploadResponse {
    fn from(asset: StoredAsset) -> Self {
        let (file_path, blob_url) = match asset.public_ref {
            PublicRef::LocalPath(path) => (Some(path), None),
            PublicRef::RemoteUrl(url) => (None, Some(url)),
        };

        Self {
            success: true,
            file_path,
            blob_url,
            file_name: asset.file_name,
            original_name: asset.original_name,
            size: asset.size,
            mime_type: asset.mime_type,
        }
    }
}

fn multipart_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge
    } else {
        UploadError::UploadFailed(err.body_text())
    }
}

/// Collect the form fields of an upload.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadRequest, UploadError> {
    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let original_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                request.file = Some(IncomingFile {
                    original_name,
                    content_type,
                    data,
                });
            }
            "section" => request.section = field.text().await.map_err(multipart_error)?,
            "field" => request.field = field.text().await.map_err(multipart_error)?,
            "testimonialId" => {
                let id = field.text().await.map_err(multipart_error)?;
                request.testimonial_id = Some(id.trim().to_string()).filter(|s| !s.is_empty());
            }
            _ => {}
        }
    }

    Ok(request)
}

async fn handle_upload(
    state: &AppState,
    store: &dyn AssetStore,
    user: Option<SessionUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, UploadError> {
    let multipart = multipart.map_err(|e| UploadError::UploadFailed(e.body_text()))?;
    let request = read_upload_form(multipart).await?;

    let section = request.section.clone();
    let field = request.field.clone();
    let testimonial_id = request.testimonial_id.clone();

    let asset = process_upload(store, request, chrono::Utc::now().timestamp_millis()).await?;

    state.activity_log.spawn_log(
        user,
        ActivityAction::FileUploaded,
        testimonial_id.clone().unwrap_or_else(|| asset.file_name.clone()),
        ActivityDetails::Upload {
            file_name: asset.file_name.clone(),
            original_name: asset.original_name.clone(),
            section,
            field,
            size: asset.size,
            testimonial_id,
        },
    );

    Ok(Json(asset.into()))
}

/// POST /api/upload - store on local disk.
async fn upload_local(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<SessionUser>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, UploadError> {
    let user = user.map(|Extension(u)| u);
    handle_upload(&state, &state.local_store, user, multipart).await
}

/// POST /api/upload/blob - store in remote blob storage.
async fn upload_blob(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<SessionUser>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, UploadError> {
    let Some(store) = state.blob_store.as_ref() else {
        return Err(UploadError::UploadFailed(
            "blob storage is not configured".to_string(),
        ));
    };
    let user = user.map(|Extension(u)| u);
    handle_upload(&state, store, user, multipart).await
}

/// Content type served for a stored file, by extension.
pub fn content_type_for(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn file_not_found() -> Response {
    (StatusCode::NOT_FOUND, "File not found").into_response()
}

/// GET /api/uploads/{*path} - serve a stored upload.
async fn serve_upload(State(state): State<Arc<AppState>>, Path(path): Path<String>) -> Response {
    let Some(file_path) = state.local_store.resolve(&path) else {
        tracing::warn!(path = %path, "Rejected upload path");
        return file_not_found();
    };

    match tokio::fs::metadata(&file_path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return file_not_found(),
    }

    match tokio::fs::read(&file_path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, content_type_for(&file_path)),
                (header::CACHE_CONTROL, IMMUTABLE_CACHE),
            ],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => file_not_found(),
        Err(e) => {
            tracing::error!(error = %e, path = %file_path.display(), "Failed to read upload");
            (StatusCode::INTERNAL_SERVER_ERROR, "Error serving file").into_response()
        }
    }
}
