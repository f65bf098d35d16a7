//! HTTP API integration tests (router driven with tower `oneshot`)

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dactyl_capture::archive::MemoryArchive;
use dactyl_capture::{build_router, AppState};
use dactyl_common::config::Language;
use dactyl_common::db::init_memory_database;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

async fn setup_app(language: Language) -> (axum::Router, MemoryArchive) {
    let db = init_memory_database().await.expect("memory database");
    let archive = MemoryArchive::new();
    let state = AppState::new(db, Arc::new(archive.clone()), language);
    (build_router(state), archive)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn create_person(app: &axum::Router, card: &str) -> Value {
    let response = app
        .clone()
        .oneshot(post_json(
            "/persons",
            json!({"identity_card": card, "first_name": "Ana", "last_name": "Ruiz"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response.into_body()).await
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = setup_app(Language::En).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "dactyl-capture");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_duplicate_person_is_conflict() {
    let (app, _) = setup_app(Language::En).await;
    create_person(&app, "1712345678").await;

    let response = app
        .oneshot(post_json("/persons", json!({"identity_card": "1712345678"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_get_person_by_identity_card_and_guid() {
    let (app, _) = setup_app(Language::En).await;
    let created = create_person(&app, "0102030405").await;
    let guid = created["guid"].as_str().unwrap().to_string();

    let response = app.clone().oneshot(get("/persons/0102030405")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await["guid"], guid.as_str());

    let response = app.oneshot(get(&format!("/persons/{}", guid))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_person_is_404() {
    let (app, _) = setup_app(Language::En).await;

    let response = app.oneshot(get("/persons/9999999999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_fingerprint_types_listed() {
    let (app, _) = setup_app(Language::En).await;

    let response = app.oneshot(get("/fingerprint-types")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let types = body.as_array().unwrap();
    assert_eq!(types.len(), 10);
    assert_eq!(types[0]["short_name"], "RT");
}

#[tokio::test]
async fn test_submit_list_and_compare() {
    let (app, archive) = setup_app(Language::Es).await;
    create_person(&app, "1712345678").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/persons/1712345678/fingerprints",
            json!({"fingerprints": [
                {"fingerprint_type_id": 1, "quality": 60, "image": STANDARD.encode(b"thumb")},
                {"fingerprint_type_id": 42, "quality": 60, "image": STANDARD.encode(b"x")},
            ]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Huellas registradas: Right thumb.");
    assert_eq!(body["results"]["success"], json!(["Right thumb"]));
    assert_eq!(body["results"]["error"], json!(["type #42"]));
    assert_eq!(archive.connects(), archive.disconnects());

    let response = app
        .clone()
        .oneshot(get("/persons/1712345678/fingerprints"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        extract_json(response.into_body()).await,
        json!([{"type_id": 1, "name": "Right thumb"}])
    );

    let response = app
        .oneshot(get("/persons/1712345678/fingerprints/comparison"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body[0]["quality"], 60);
    assert_eq!(body[0]["fingerprint_type"]["name"], "Right thumb");
    assert_eq!(body[0]["image"], STANDARD.encode(b"thumb"));
}

#[tokio::test]
async fn test_comparison_without_fingerprints_is_404() {
    let (app, _) = setup_app(Language::En).await;
    create_person(&app, "1712345678").await;

    let response = app
        .oneshot(get("/persons/1712345678/fingerprints/comparison"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comparison_download_failure_is_502() {
    let (app, archive) = setup_app(Language::En).await;
    let person = create_person(&app, "1712345678").await;
    let guid = person["guid"].as_str().unwrap().to_string();

    app.clone()
        .oneshot(post_json(
            "/persons/1712345678/fingerprints",
            json!({"fingerprints": [
                {"fingerprint_type_id": 1, "quality": 60, "image": STANDARD.encode(b"t")},
            ]}),
        ))
        .await
        .unwrap();
    archive.fail_download(format!("Person/Fingerprints/{}/RT.wsq", guid));

    let response = app
        .oneshot(get("/persons/1712345678/fingerprints/comparison"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "TRANSFER_FAILURE");
}
