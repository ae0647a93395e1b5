// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image upload validation and persistence.
//!
//! Checks run in a fixed order and stop at the first failure:
//! 1. a file is present
//! 2. its size is at most 5 MiB
//! 3. its declared MIME type is an allowed image type
//!
//! Only then is the file handed to an [`AssetStore`].

use crate::services::storage::{AssetStore, PublicRef};
use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Largest accepted file, inclusive.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

const DEFAULT_EXTENSION: &str = "jpg";

/// A file received in a multipart upload.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// One upload request. Exists only for the duration of the request.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file: Option<IncomingFile>,
    pub section: String,
    pub field: String,
    pub testimonial_id: Option<String>,
}

/// Successful upload descriptor.
#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub file_name: String,
    pub public_ref: PublicRef,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file provided")]
    NoFile,

    #[error("File too large. Maximum size is 5MB.")]
    TooLarge,

    #[error("Invalid file type. Only images are allowed.")]
    InvalidType,

    #[error("Failed to upload file: {0}")]
    UploadFailed(String),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::NoFile | UploadError::TooLarge | UploadError::InvalidType => {
                StatusCode::BAD_REQUEST
            }
            UploadError::UploadFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct UploadErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Upload failed");
        } else {
            tracing::info!(error = %self, "Upload rejected");
        }

        let body = UploadErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Run the presence, size, and type checks in order.
pub fn validate(file: Option<&IncomingFile>) -> Result<&IncomingFile, UploadError> {
    let file = file.ok_or(UploadError::NoFile)?;

    if file.data.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }

    let mime = file.content_type.trim().to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(UploadError::InvalidType);
    }

    Ok(file)
}

/// Extension after the last `.` of the original name, `jpg` when absent.
pub fn file_extension(original_name: &str) -> &str {
    match original_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => DEFAULT_EXTENSION,
    }
}

/// Restrict a name component to `[A-Za-z0-9_-]`.
fn sanitize_component(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Build `{section}-{field}-{millis}.{ext}`.
///
/// Two uploads for the same section and field in the same millisecond get
/// the same name and the later write wins. No collision detection is done.
pub fn stored_file_name(section: &str, field: &str, unix_millis: i64, ext: &str) -> String {
    format!(
        "{}-{}-{}.{}",
        sanitize_component(section),
        sanitize_component(field),
        unix_millis,
        sanitize_component(ext)
    )
}

/// Validate and persist one upload.
pub async fn process_upload(
    store: &dyn AssetStore,
    request: UploadRequest,
    unix_millis: i64,
) -> Result<StoredAsset, UploadError> {
    let file = validate(request.file.as_ref())?;

    let ext = file_extension(&file.original_name);
    let file_name = stored_file_name(&request.section, &request.field, unix_millis, ext);
    let size = file.data.len() as u64;

    let public_ref = store
        .put(&file_name, &file.content_type, file.data.clone())
        .await
        .map_err(|e| UploadError::UploadFailed(e.to_string()))?;

    tracing::info!(
        file_name = %file_name,
        section = %request.section,
        field = %request.field,
        size,
        "Upload stored"
    );

    Ok(StoredAsset {
        file_name,
        public_ref,
        original_name: file.original_name.clone(),
        size,
        mime_type: file.content_type.clone(),
    })
}
