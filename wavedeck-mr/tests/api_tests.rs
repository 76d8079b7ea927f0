//! HTTP API tests driving the router directly

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use helpers::{ixml_doc, write_wav};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wavedeck_mr::{build_router, AppState};

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(dir.path().to_path_buf()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "wavedeck-mr");
}

#[tokio::test]
async fn read_returns_resolved_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("PR2_Allen_Sc5.14D_01.wav");
    write_wav(&path, Some(&ixml_doc(&[("SCENE", "7")])), None);

    let app = build_router(AppState::new(dir.path().to_path_buf()));
    let response = app
        .oneshot(post(
            "/metadata/read",
            json!({"path": path.display().to_string()}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["scene"], "7");
    assert_eq!(body["take"], "01");
    assert_eq!(body["info"]["sample_rate"], 48_000);
}

#[tokio::test]
async fn read_maps_errors_to_statuses() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(dir.path().to_path_buf()));

    let response = app
        .clone()
        .oneshot(post(
            "/metadata/read",
            json!({"path": dir.path().join("gone.wav").display().to_string()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let flac = dir.path().join("x.flac");
    std::fs::write(&flac, b"data").unwrap();
    let response = app
        .oneshot(post(
            "/metadata/read",
            json!({"path": flac.display().to_string()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
}

#[tokio::test]
async fn read_batch_scans_the_root_folder_by_default() {
    let dir = tempfile::tempdir().unwrap();
    write_wav(&dir.path().join("PR2_A_Sc1_01.wav"), None, None);
    write_wav(&dir.path().join("PR2_B_Sc2_01.wav"), None, None);
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

    let app = build_router(AppState::new(dir.path().to_path_buf()));
    let response = app
        .oneshot(post("/metadata/read_batch", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["records"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn write_then_read_round_trips_over_the_api() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("PR2_Allen_Sc1_01.wav");
    write_wav(&path, Some(&ixml_doc(&[("SCENE", "1")])), None);

    let app = build_router(AppState::new(dir.path().to_path_buf()));

    let response = app
        .clone()
        .oneshot(post(
            "/metadata/read",
            json!({"path": path.display().to_string()}),
        ))
        .await
        .unwrap();
    let mut record = json_body(response).await;
    record["scene"] = json!("42");
    record["note"] = json!("checked");

    let response = app
        .clone()
        .oneshot(post(
            "/metadata/write",
            json!({"path": path.display().to_string(), "record": record}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post(
            "/metadata/read",
            json!({"path": path.display().to_string()}),
        ))
        .await
        .unwrap();
    let reread = json_body(response).await;
    assert_eq!(reread["scene"], "42");
    assert_eq!(reread["note"], "checked");
}

#[tokio::test]
async fn mirror_endpoint_copies_and_reports_conflicts() {
    let src = tempfile::tempdir().unwrap();
    let dest = tempfile::tempdir().unwrap();
    let path = src.path().join("PR2_Allen_Sc1_01.wav");
    write_wav(&path, Some(&ixml_doc(&[("PROJECT", "PR2")])), None);

    let app = build_router(AppState::new(src.path().to_path_buf()));

    let response = app
        .clone()
        .oneshot(post(
            "/metadata/read",
            json!({"path": path.display().to_string()}),
        ))
        .await
        .unwrap();
    let record = json_body(response).await;

    let mirror_request = json!({
        "config": {
            "destination_root": dest.path().display().to_string(),
            "organize_levels": [{"field": "show", "order": 0}],
        },
        "records": [record],
    });

    let response = app
        .clone()
        .oneshot(post("/mirror", mirror_request.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["copied_count"], 1);
    assert_eq!(body["success"], true);

    // Second pass over the same set is all conflicts
    let response = app
        .clone()
        .oneshot(post("/mirror/conflicts", mirror_request.clone()))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["conflicts"].as_array().unwrap().len(), 1);

    let response = app.oneshot(post("/mirror", mirror_request)).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["copied_count"], 0);
    assert_eq!(body["conflicts"].as_array().unwrap().len(), 1);
    assert_eq!(body["conflicts"][0]["action"], "skip");
}

#[tokio::test]
async fn mirror_rejects_blank_destination() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(AppState::new(dir.path().to_path_buf()));

    let response = app
        .oneshot(post(
            "/mirror",
            json!({"config": {"destination_root": "  ", "organize_levels": []}, "records": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
