//! REST API integration tests
//!
//! Drives the full router (including the response-cache middleware)
//! against a temp-dir backed state.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

use api_server::state::AppState;
use tarefas_core::purge::start_purge_worker;

async fn test_app() -> (Router, AppState, TempDir) {
    let temp = TempDir::new().unwrap();
    let state = AppState::new(temp.path().to_path_buf()).await.unwrap();
    (api_server::app(state.clone()), state, temp)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_task(app: &Router, nome: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "nome": nome })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"].clone()
}

#[tokio::test]
async fn test_create_task_returns_201() {
    let (app, _state, _temp) = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({
            "nome": "Buy milk",
            "descricao": "Two liters",
            "data_limite": "2026-09-01"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["nome"], json!("Buy milk"));
    assert_eq!(body["data"]["descricao"], json!("Two liters"));
    assert_eq!(body["data"]["data_limite"], json!("2026-09-01"));
    assert_eq!(body["data"]["finalizado"], json!(false));
    assert!(body["data"]["id"].is_string());
}

#[tokio::test]
async fn test_create_without_nome_returns_422() {
    let (app, state, _temp) = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({ "descricao": "no name" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
    assert!(body["errors"]["nome"][0].is_string());

    // No mutation happened
    assert!(state.service().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_validation_covers_all_fields() {
    let (app, _state, _temp) = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/tasks",
        Some(json!({
            "nome": "x".repeat(256),
            "data_limite": "not-a-date"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["nome"][0]
        .as_str()
        .unwrap()
        .contains("255"));
    assert!(body["errors"]["data_limite"][0]
        .as_str()
        .unwrap()
        .contains("valid date"));
}

#[tokio::test]
async fn test_get_missing_task_returns_404() {
    let (app, _state, _temp) = test_app().await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/tasks/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_get_returns_created_task() {
    let (app, _state, _temp) = test_app().await;

    let created = create_task(&app, "Read a book").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, Method::GET, &format!("/api/tasks/{id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["nome"], json!("Read a book"));
}

#[tokio::test]
async fn test_list_excludes_deleted_tasks() {
    let (app, _state, _temp) = test_app().await;

    let first = create_task(&app, "First").await;
    let _second = create_task(&app, "Second").await;

    let first_id = first["id"].as_str().unwrap();
    let (status, _) = send(&app, Method::DELETE, &format!("/api/tasks/{first_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/tasks", None).await;
    assert_eq!(status, StatusCode::OK);

    let tasks = body["data"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["nome"], json!("Second"));
}

#[tokio::test]
async fn test_update_applies_only_supplied_fields() {
    let (app, _state, _temp) = test_app().await;

    let created = create_task(&app, "Original").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/tasks/{id}"),
        Some(json!({ "descricao": "added later" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nome"], json!("Original"));
    assert_eq!(body["data"]["descricao"], json!("added later"));
}

#[tokio::test]
async fn test_update_with_empty_nome_returns_422_without_mutation() {
    let (app, state, _temp) = test_app().await;

    let created = create_task(&app, "Keep this name").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/tasks/{id}"),
        Some(json!({ "nome": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["nome"][0].is_string());

    let stored = state
        .service()
        .find(created["id"].as_str().unwrap().parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.nome, "Keep this name");
}

#[tokio::test]
async fn test_update_missing_task_returns_404() {
    let (app, _state, _temp) = test_app().await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/tasks/00000000-0000-0000-0000-000000000000",
        Some(json!({ "nome": "whatever" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_toggle_flips_flag_and_schedules_purge() {
    let (app, state, _temp) = test_app().await;

    let created = create_task(&app, "Finish report").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/tasks/{id}/toggle"),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["finalizado"], json!(true));

    let pending = state.purge_queue().pending().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].task_id.to_string(), id);

    // Ten-minute delay
    let delay = pending[0].fire_at - chrono::Utc::now();
    assert!(delay > chrono::Duration::seconds(590));
    assert!(delay <= chrono::Duration::seconds(600));
}

#[tokio::test]
async fn test_delete_returns_acknowledgment() {
    let (app, _state, _temp) = test_app().await;

    let created = create_task(&app, "Trash me").await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(&app, Method::DELETE, &format!("/api/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["message"].as_str().unwrap().contains("deleted"));

    // Soft-deleted task is gone from the read path
    let (status, _) = send(&app, Method::GET, &format!("/api/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_completed_task_is_purged_end_to_end() {
    let temp = TempDir::new().unwrap();
    let state = AppState::with_purge_delay(
        temp.path().to_path_buf(),
        chrono::Duration::milliseconds(30),
    )
    .await
    .unwrap();
    let app = api_server::app(state.clone());

    start_purge_worker(
        state.purge_queue(),
        state.store(),
        state.cache(),
        Duration::from_millis(10),
    );

    let created = create_task(&app, "Short-lived").await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/tasks/{id}/toggle"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(150)).await;

    let (status, _) = send(&app, Method::GET, &format!("/api/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_toggled_back_task_survives_purge() {
    let temp = TempDir::new().unwrap();
    let state = AppState::with_purge_delay(
        temp.path().to_path_buf(),
        chrono::Duration::milliseconds(30),
    )
    .await
    .unwrap();
    let app = api_server::app(state.clone());

    start_purge_worker(
        state.purge_queue(),
        state.store(),
        state.cache(),
        Duration::from_millis(10),
    );

    let created = create_task(&app, "Changed my mind").await;
    let id = created["id"].as_str().unwrap();
    let toggle_uri = format!("/api/tasks/{id}/toggle");

    let (_, body) = send(&app, Method::PATCH, &toggle_uri, None).await;
    assert_eq!(body["data"]["finalizado"], json!(true));

    let (_, body) = send(&app, Method::PATCH, &toggle_uri, None).await;
    assert_eq!(body["data"]["finalizado"], json!(false));

    tokio::time::sleep(Duration::from_millis(150)).await;

    // Only the toggle-on scheduled a job; it fired, re-checked the
    // flag, and no-oped
    let (status, body) = send(&app, Method::GET, &format!("/api/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["finalizado"], json!(false));
}

#[tokio::test]
async fn test_response_cache_serves_stale_get_within_ttl() {
    let (app, _state, _temp) = test_app().await;

    let created = create_task(&app, "Before rename").await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/api/tasks/{id}");

    // Prime the transport cache
    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["data"]["nome"], json!("Before rename"));

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(json!({ "nome": "After rename" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The URL-keyed cache is only invalidated by time, so the GET is
    // served stale within the TTL.
    let (_, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(body["data"]["nome"], json!("Before rename"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state, _temp) = test_app().await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert!(body["version"].is_string());
}
