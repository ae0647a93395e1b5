// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Upload endpoint and stored-file retrieval tests.
//!
//! Local uploads go to a per-test temporary directory. Blob uploads go to a
//! fake blob service on a local port.

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    routing::put,
    Json, Router,
};
use gym_portal::config::Config;
use gym_portal::services::upload::MAX_UPLOAD_BYTES;
use tower::ServiceExt;

mod common;

use common::{body_json, get, multipart_request, FilePart};

fn app_with_upload_dir(dir: &tempfile::TempDir) -> axum::Router {
    let mut config = Config::test_default();
    config.upload_dir = dir.path().to_path_buf();
    common::create_test_app_with_config(config).0
}

fn jpeg(data: &[u8]) -> FilePart<'_> {
    FilePart {
        file_name: "photo.jpg",
        content_type: "image/jpeg",
        data,
    }
}

const HERO_FIELDS: &[(&str, &str)] = &[("section", "home-config"), ("field", "hero")];

// ─── Validation ──────────────────────────────────────────────

#[tokio::test]
async fn test_missing_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);

    let response = app
        .oneshot(multipart_request("/api/upload", HERO_FIELDS, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "No file provided");
}

#[tokio::test]
async fn test_file_at_size_limit_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);
    let data = vec![0xAB; MAX_UPLOAD_BYTES];

    let response = app
        .oneshot(multipart_request("/api/upload", HERO_FIELDS, Some(jpeg(&data))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["size"], MAX_UPLOAD_BYTES as u64);
}

#[tokio::test]
async fn test_file_over_size_limit_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);
    let data = vec![0xAB; MAX_UPLOAD_BYTES + 1];

    let response = app
        .oneshot(multipart_request("/api/upload", HERO_FIELDS, Some(jpeg(&data))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "File too large. Maximum size is 5MB.");

    // Nothing was written
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_non_image_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);

    let file = FilePart {
        file_name: "notes.txt",
        content_type: "text/plain",
        data: b"hello",
    };
    let response = app
        .oneshot(multipart_request("/api/upload", HERO_FIELDS, Some(file)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid file type. Only images are allowed.");
}

#[tokio::test]
async fn test_size_is_checked_before_type() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);
    let data = vec![0u8; MAX_UPLOAD_BYTES + 1];

    let file = FilePart {
        file_name: "big.txt",
        content_type: "text/plain",
        data: &data,
    };
    let response = app
        .oneshot(multipart_request("/api/upload", HERO_FIELDS, Some(file)))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["error"], "File too large. Maximum size is 5MB.");
}

#[tokio::test]
async fn test_non_multipart_body_fails_upload() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);

    let response = app
        .oneshot(common::post_json(
            "/api/upload",
            None,
            serde_json::json!({"file": "nope"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to upload file"));
}

// ─── Local storage ───────────────────────────────────────────

#[tokio::test]
async fn test_local_upload_names_and_stores_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);

    let response = app
        .oneshot(multipart_request(
            "/api/upload",
            HERO_FIELDS,
            Some(jpeg(b"jpeg-bytes")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["originalName"], "photo.jpg");
    assert_eq!(json["size"], 10);
    assert_eq!(json["type"], "image/jpeg");
    assert!(json.get("blobUrl").is_none());

    let file_name = json["fileName"].as_str().unwrap();
    let millis = file_name
        .strip_prefix("home-config-hero-")
        .and_then(|rest| rest.strip_suffix(".jpg"))
        .expect("name is home-config-hero-<millis>.jpg");
    assert!(!millis.is_empty() && millis.chars().all(|c| c.is_ascii_digit()));

    assert_eq!(json["filePath"], format!("/api/uploads/{}", file_name));
    assert_eq!(std::fs::read(dir.path().join(file_name)).unwrap(), b"jpeg-bytes");
}

#[tokio::test]
async fn test_webp_is_accepted_and_extension_kept() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);

    let file = FilePart {
        file_name: "banner.webp",
        content_type: "image/webp",
        data: b"RIFF....WEBP",
    };
    let response = app
        .oneshot(multipart_request(
            "/api/upload",
            &[("section", "about"), ("field", "banner")],
            Some(file),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let file_name = json["fileName"].as_str().unwrap();
    assert!(file_name.starts_with("about-banner-"));
    assert!(file_name.ends_with(".webp"));
}

#[tokio::test]
async fn test_name_components_cannot_escape_upload_dir() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);

    let response = app
        .oneshot(multipart_request(
            "/api/upload",
            &[("section", "../../etc"), ("field", "a/b")],
            Some(jpeg(b"x")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let file_name = json["fileName"].as_str().unwrap();
    assert!(!file_name.contains('/'));
    assert!(dir.path().join(file_name).is_file());
}

#[tokio::test]
async fn test_uploaded_file_is_served_back() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);

    let file = FilePart {
        file_name: "logo.png",
        content_type: "image/png",
        data: b"\x89PNG-data",
    };
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/upload",
            &[("section", "site"), ("field", "logo")],
            Some(file),
        ))
        .await
        .unwrap();
    let json = body_json(response).await;
    let file_path = json["filePath"].as_str().unwrap().to_string();

    let response = app.oneshot(get(&file_path, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"\x89PNG-data");
}

// ─── Retrieval ───────────────────────────────────────────────

#[tokio::test]
async fn test_missing_stored_file_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);

    let response = app
        .oneshot(get("/api/uploads/nothing-here.png", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"File not found");
}

#[tokio::test]
async fn test_traversal_outside_upload_dir_is_404() {
    let parent = tempfile::tempdir().unwrap();
    let uploads = parent.path().join("uploads");
    std::fs::create_dir_all(&uploads).unwrap();
    std::fs::write(parent.path().join("secret.txt"), b"secret").unwrap();

    let mut config = Config::test_default();
    config.upload_dir = uploads;
    let (app, _) = common::create_test_app_with_config(config);

    let response = app
        .oneshot(get("/api/uploads/%2E%2E/secret.txt", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_extension_served_as_octet_stream() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("legacy.bin"), b"raw").unwrap();
    let app = app_with_upload_dir(&dir);

    let response = app.oneshot(get("/api/uploads/legacy.bin", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
}

// ─── Blob storage ────────────────────────────────────────────

#[tokio::test]
async fn test_blob_upload_without_configuration_fails() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_with_upload_dir(&dir);

    let response = app
        .oneshot(multipart_request(
            "/api/upload/blob",
            HERO_FIELDS,
            Some(jpeg(b"x")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(
        json["error"],
        "Failed to upload file: blob storage is not configured"
    );
}

#[tokio::test]
async fn test_blob_upload_validates_before_storing() {
    let fake = Router::new().route(
        "/uploads/{name}",
        put(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "should not be called") }),
    );
    let base_url = common::spawn_server(fake).await;

    let mut config = Config::test_default();
    config.blob_base_url = Some(base_url);
    config.blob_token = Some("blob-token".to_string());
    let (app, _) = common::create_test_app_with_config(config);

    let response = app
        .oneshot(multipart_request("/api/upload/blob", HERO_FIELDS, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file provided");
}

#[tokio::test]
async fn test_blob_upload_returns_remote_url() {
    let fake = Router::new().route(
        "/uploads/{name}",
        put(|Path(name): Path<String>, headers: HeaderMap| async move {
            if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok())
                != Some("Bearer blob-token")
            {
                return Err(StatusCode::UNAUTHORIZED);
            }
            Ok(Json(serde_json::json!({
                "url": format!("https://blob.test/uploads/{}", name)
            })))
        }),
    );
    let base_url = common::spawn_server(fake).await;

    let mut config = Config::test_default();
    config.blob_base_url = Some(base_url);
    config.blob_token = Some("blob-token".to_string());
    let (app, _) = common::create_test_app_with_config(config);

    let response = app
        .oneshot(multipart_request(
            "/api/upload/blob",
            HERO_FIELDS,
            Some(jpeg(b"jpeg-bytes")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let file_name = json["fileName"].as_str().unwrap();
    assert!(file_name.starts_with("home-config-hero-"));
    assert_eq!(
        json["blobUrl"],
        format!("https://blob.test/uploads/{}", file_name)
    );
    assert!(json.get("filePath").is_none());
}

#[tokio::test]
async fn test_blob_service_failure_is_500() {
    let fake = Router::new().route(
        "/uploads/{name}",
        put(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let base_url = common::spawn_server(fake).await;

    let mut config = Config::test_default();
    config.blob_base_url = Some(base_url);
    config.blob_token = Some("blob-token".to_string());
    let (app, _) = common::create_test_app_with_config(config);

    let response = app
        .oneshot(multipart_request(
            "/api/upload/blob",
            HERO_FIELDS,
            Some(jpeg(b"x")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to upload file: "));
}
