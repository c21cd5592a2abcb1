//! Variant serving integration tests.
//!
//! Run with: `cargo test -p pixvault-api --test variants_test`

#![cfg(feature = "native")]

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::{count_files, fixtures, setup_test_app, TestApp};
use serde_json::Value;
use std::future::IntoFuture;

/// Upload a PNG and return its public URL.
async fn upload_png(app: &TestApp, category: &str, width: u32, height: u32) -> (String, Vec<u8>) {
    let data = fixtures::png(width, height);
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(data.clone())
            .file_name("source.png")
            .mime_type("image/png"),
    );
    let response = app
        .client()
        .post(&format!("/upload/{}", category))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    (body["fileUrl"].as_str().unwrap().to_string(), data)
}

#[tokio::test]
async fn test_original_served_without_dimensions() {
    let app = setup_test_app().await;
    let (url, data) = upload_png(&app, "profileImage", 40, 20).await;

    let response = app.client().get(&url).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.as_bytes().as_ref(), data.as_slice());
    assert_eq!(response.header("content-type"), "image/png");
    assert_eq!(
        response.header("cache-control"),
        "public, max-age=3600, immutable"
    );
    assert_eq!(app.transcode_calls(), 0);
    assert_eq!(count_files(&app.cache_dir()), 0);
}

#[tokio::test]
async fn test_width_only_keeps_aspect_ratio_and_is_cached() {
    let app = setup_test_app().await;
    let (url, _) = upload_png(&app, "postImage", 200, 100).await;

    let first = app
        .client()
        .get(&url)
        .add_query_param("width", 100)
        .await;
    assert_eq!(first.status_code(), 200);
    let resized = image::load_from_memory(first.as_bytes()).unwrap();
    assert_eq!((resized.width(), resized.height()), (100, 50));

    let second = app
        .client()
        .get(&url)
        .add_query_param("width", 100)
        .await;
    assert_eq!(second.status_code(), 200);
    assert_eq!(first.as_bytes(), second.as_bytes());

    assert_eq!(app.transcode_calls(), 1);
    assert_eq!(count_files(&app.cache_dir()), 1);
}

#[tokio::test]
async fn test_both_dimensions() {
    let app = setup_test_app().await;
    let (url, _) = upload_png(&app, "postImage", 64, 64).await;

    let response = app
        .client()
        .get(&url)
        .add_query_param("width", 30)
        .add_query_param("height", 10)
        .await;

    assert_eq!(response.status_code(), 200);
    let resized = image::load_from_memory(response.as_bytes()).unwrap();
    assert_eq!((resized.width(), resized.height()), (30, 10));
}

#[tokio::test]
async fn test_distinct_sizes_get_distinct_cache_entries() {
    let app = setup_test_app().await;
    let (url, _) = upload_png(&app, "postImage", 80, 80).await;

    for width in [10, 20, 40] {
        let response = app
            .client()
            .get(&url)
            .add_query_param("width", width)
            .await;
        assert_eq!(response.status_code(), 200);
    }

    assert_eq!(app.transcode_calls(), 3);
    assert_eq!(count_files(&app.cache_dir()), 3);
}

#[tokio::test]
async fn test_concurrent_requests_share_one_transcode() {
    let app = setup_test_app().await;
    let (url, _) = upload_png(&app, "postImage", 300, 300).await;

    let request = || {
        app.client()
            .get(&url)
            .add_query_param("width", 50)
            .into_future()
    };
    let (a, b, c, d) = tokio::join!(request(), request(), request(), request());

    for response in [&a, &b, &c, &d] {
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.as_bytes(), a.as_bytes());
    }
    assert_eq!(app.transcode_calls(), 1);
    assert_eq!(count_files(&app.cache_dir()), 1);
}

#[tokio::test]
async fn test_missing_original_is_not_found_and_not_cached() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/uploads/postImage/does-not-exist.png")
        .add_query_param("width", 10)
        .await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"], "Image not found");
    assert_eq!(app.transcode_calls(), 0);
    assert_eq!(count_files(&app.cache_dir()), 0);
}

#[tokio::test]
async fn test_categories_are_isolated() {
    let app = setup_test_app().await;
    let (url, _) = upload_png(&app, "profileImage", 10, 10).await;
    let other = url.replace("/profileImage/", "/postImage/");

    let response = app.client().get(&other).await;
    assert_eq!(response.status_code(), 404);

    let response = app.client().get("/uploads/coverImage/whatever.png").await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_invalid_dimensions_rejected() {
    let app = setup_test_app().await;
    let (url, _) = upload_png(&app, "postImage", 10, 10).await;

    for bad in ["abc", "-1", "0", "1.5", "100000"] {
        let response = app
            .client()
            .get(&url)
            .add_query_param("width", bad)
            .await;
        assert_eq!(response.status_code(), 400, "width={} accepted", bad);
    }

    assert_eq!(app.transcode_calls(), 0);
    assert_eq!(count_files(&app.cache_dir()), 0);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = setup_test_app().await;

    let live = app.client().get("/health").await;
    assert_eq!(live.status_code(), 200);
    assert_eq!(live.json::<Value>()["status"], "alive");

    let ready = app.client().get("/health/ready").await;
    assert_eq!(ready.status_code(), 200);
    let body: Value = ready.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["media_backend"], "native");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["paths"]["/upload/{category}"].is_object());
}
