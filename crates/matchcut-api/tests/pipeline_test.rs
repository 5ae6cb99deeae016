//! End-to-end tests for the upload and synchronous analyzer endpoints.

mod helpers;

use axum::http::StatusCode;
use helpers::*;
use serde_json::Value;

const CLIP: &[u8] = b"not really mpeg4 but good enough";

#[tokio::test]
async fn test_upload_stages_file() {
    let app = setup_test_app().await;

    let res = app
        .server
        .post("/api/upload-video")
        .multipart(video_form("video", "clip.mp4", CLIP.to_vec()))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["success"], true);

    let file_name = body["fileName"].as_str().unwrap();
    assert!(file_name.starts_with("video_"));
    assert!(file_name.ends_with("_clip.mp4"));

    let file_path = body["filePath"].as_str().unwrap();
    assert!(file_path.starts_with('/'), "expected absolute path, got {file_path}");
    assert_eq!(std::fs::read(file_path).unwrap(), CLIP);
    assert!(app.staging.join(file_name).exists());
}

#[tokio::test]
async fn test_upload_sanitizes_hostile_file_names() {
    let app = setup_test_app().await;

    let res = app
        .server
        .post("/api/upload-video")
        .multipart(video_form("video", "my clip;rm -rf.mp4", CLIP.to_vec()))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    let file_name = body["fileName"].as_str().unwrap();
    assert!(file_name.ends_with("_my_clip_rm_-rf.mp4"), "got {file_name}");
}

#[tokio::test]
async fn test_upload_requires_video_field() {
    let app = setup_test_app().await;

    let res = app
        .server
        .post("/api/upload-video")
        .multipart(video_form("file", "clip.mp4", CLIP.to_vec()))
        .await;

    res.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = res.json();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("video"));

    let staged: Vec<_> = std::fs::read_dir(&app.staging).unwrap().collect();
    assert!(staged.is_empty(), "nothing should have been staged");
}

#[tokio::test]
async fn test_upload_rejects_oversized_video() {
    let app = setup_test_app_with(TestAppOptions {
        max_video_size_bytes: 1024 * 1024,
        ..Default::default()
    })
    .await;

    let big = vec![0u8; 1024 * 1024 + 512 * 1024];
    let res = app
        .server
        .post("/api/upload-video")
        .multipart(video_form("video", "big.mp4", big))
        .await;

    res.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = res.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn test_run_model_publishes_output() {
    let app = setup_test_app().await;
    let staged = upload_clip(&app, "clip.mp4", CLIP).await;

    let res = app
        .server
        .post("/api/run-model")
        .json(&serde_json::json!({ "fileName": staged }))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["success"], true);

    let video_url = body["videoURL"].as_str().unwrap();
    assert_eq!(video_url, format!("/output_videos/output_{}", staged));
    assert!(body["message"].is_string());

    let published = app.server.get(video_url).await;
    published.assert_status_ok();
    assert_eq!(published.into_bytes().as_ref(), CLIP);
}

#[tokio::test]
async fn test_run_model_passes_analyzer_stdout_through() {
    let app = setup_test_app_with(TestAppOptions {
        analyzer_script: Some("#!/bin/sh\ncp \"$1\" \"$2\"\necho \"7 match cuts found\"\n"),
        ..Default::default()
    })
    .await;
    let staged = upload_clip(&app, "clip.mp4", CLIP).await;

    let res = app
        .server
        .post("/api/run-model")
        .json(&serde_json::json!({ "fileName": staged }))
        .await;

    res.assert_status_ok();
    let body: Value = res.json();
    assert_eq!(body["message"], "7 match cuts found\n");
}

#[tokio::test]
async fn test_run_model_unknown_file_is_404_and_does_not_spawn() {
    let app = setup_test_app_with(TestAppOptions {
        analyzer_script: Some("#!/bin/sh\ntouch \"$(dirname \"$0\")/spawned\"\n"),
        ..Default::default()
    })
    .await;

    let res = app
        .server
        .post("/api/run-model")
        .json(&serde_json::json!({ "fileName": "video_1_ghost.mp4" }))
        .await;

    res.assert_status(StatusCode::NOT_FOUND);
    let body: Value = res.json();
    assert!(body["error"].as_str().unwrap().contains("video_1_ghost.mp4"));
    assert!(
        !app.dir.path().join("spawned").exists(),
        "analyzer must not run for a missing input"
    );
}

#[tokio::test]
async fn test_run_model_rejects_traversal_names() {
    let app = setup_test_app().await;

    for name in ["../etc/passwd", "a/b.mp4", "a\\b.mp4", ""] {
        let res = app
            .server
            .post("/api/run-model")
            .json(&serde_json::json!({ "fileName": name }))
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_failing_analyzer_returns_500_with_stderr() {
    let app = setup_test_app_with(TestAppOptions {
        analyzer_script: Some("#!/bin/sh\necho \"cv2.error: bad frame\" >&2\nexit 3\n"),
        ..Default::default()
    })
    .await;
    let staged = upload_clip(&app, "clip.mp4", CLIP).await;

    let res = app
        .server
        .post("/api/run-model")
        .json(&serde_json::json!({ "fileName": staged }))
        .await;

    res.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "ANALYZER_FAILED");
    assert!(body["error"].as_str().unwrap().contains("cv2.error"));

    let outputs = app.media_root.join("output_videos");
    let published = std::fs::read_dir(&outputs)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(published, 0, "a failed run must publish nothing");
}

#[tokio::test]
async fn test_analyzer_timeout_returns_504() {
    let app = setup_test_app_with(TestAppOptions {
        analyzer_script: Some("#!/bin/sh\nsleep 30\n"),
        analyzer_timeout_secs: 1,
        ..Default::default()
    })
    .await;
    let staged = upload_clip(&app, "clip.mp4", CLIP).await;

    let res = app
        .server
        .post("/api/run-model")
        .json(&serde_json::json!({ "fileName": staged }))
        .await;

    res.assert_status(StatusCode::GATEWAY_TIMEOUT);
    let body: Value = res.json();
    assert_eq!(body["code"], "ANALYZER_TIMEOUT");
}

#[tokio::test]
async fn test_concurrent_runs_of_same_video_conflict() {
    let app = setup_test_app_with(TestAppOptions {
        analyzer_script: Some("#!/bin/sh\nsleep 0.5\ncp \"$1\" \"$2\"\n"),
        ..Default::default()
    })
    .await;
    let staged = upload_clip(&app, "clip.mp4", CLIP).await;

    let request = serde_json::json!({ "fileName": staged });
    let (first, second) = tokio::join!(
        app.server.post("/api/run-model").json(&request),
        app.server.post("/api/run-model").json(&request),
    );

    let mut statuses = [first.status_code().as_u16(), second.status_code().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 409]);

    let conflict = if first.status_code().as_u16() == 409 {
        first
    } else {
        second
    };
    let body: Value = conflict.json();
    assert_eq!(body["code"], "ALREADY_PROCESSING");
}

#[tokio::test]
async fn test_run_model_can_rerun_after_completion() {
    let app = setup_test_app().await;
    let staged = upload_clip(&app, "clip.mp4", CLIP).await;

    for _ in 0..2 {
        let res = app
            .server
            .post("/api/run-model")
            .json(&serde_json::json!({ "fileName": staged }))
            .await;
        res.assert_status_ok();
    }
}

#[tokio::test]
async fn test_openapi_spec_and_docs_are_served() {
    let app = setup_test_app().await;

    let spec = app.server.get("/api/openapi.json").await;
    spec.assert_status_ok();
    assert!(spec.text().contains("/api/upload-video"));

    let docs = app.server.get("/docs").await;
    docs.assert_status_ok();
}
