//! Route tests against the in-memory backend

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use dkh_backend::Backend;
use dkh_core::Config;
use dkh_web::{AppState, build_app};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let config = Config::default();
    let backend = Backend::from_config(&config).unwrap();
    let state = AppState::new(config, &backend).unwrap();
    build_app(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn signed_in() -> Router {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/session",
        Some(json!({ "email": "admin@example.com", "password": "change-me" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    app
}

fn rows(page: &Value) -> &Vec<Value> {
    page["body"]["rows"].as_array().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_dashboard_redirects_to_login_when_signed_out() {
    let app = app();
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn test_login_page_is_served() {
    let app = app();
    let response = app
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_redirects_home_when_signed_in() {
    let app = signed_in().await;
    let response = app
        .oneshot(Request::get("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_bad_credentials_are_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/session",
        Some(json!({ "email": "admin@example.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "AUTHENTICATION_FAILED");
    assert_eq!(body["error"], "Invalid email or password.");

    let (_, session) = send(&app, Method::GET, "/api/session", None).await;
    assert_eq!(session["phase"], "unauthenticated");
    assert_eq!(session["error"], "Invalid email or password.");
}

#[tokio::test]
async fn test_entries_require_a_session() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/api/entries", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signed_in_operator_sees_seeded_entries() {
    let app = signed_in().await;

    let (_, session) = send(&app, Method::GET, "/api/session", None).await;
    assert_eq!(session["phase"], "authenticated");
    assert_eq!(session["nav"]["operator_email"], "admin@example.com");

    let (status, page) = send(&app, Method::GET, "/api/entries", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["collection"], "consultations");
    assert_eq!(page["body"]["kind"], "table");
    assert_eq!(rows(&page).len(), 3);
    assert_eq!(page["headers"].as_array().unwrap().len(), 7);
    assert!(page["error_banner"].is_null());
}

#[tokio::test]
async fn test_status_change_is_persisted() {
    let app = signed_in().await;
    send(&app, Method::GET, "/api/entries", None).await;

    let (status, page) = send(
        &app,
        Method::PUT,
        "/api/entries/c-1001/status",
        Some(json!({ "status": "reviewed" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let row = rows(&page).iter().find(|row| row["id"] == "c-1001").unwrap();
    assert_eq!(row["status"], "reviewed");
}

#[tokio::test]
async fn test_status_change_for_unknown_entry_is_not_found() {
    let app = signed_in().await;
    send(&app, Method::GET, "/api/entries", None).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/entries/missing/status",
        Some(json!({ "status": "new" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_flow() {
    let app = signed_in().await;
    send(&app, Method::GET, "/api/entries", None).await;

    let (status, page) = send(&app, Method::POST, "/api/entries/c-1002/delete", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["delete_dialog"]["id"], "c-1002");

    let (status, page) = send(&app, Method::POST, "/api/delete/confirm", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["delete_dialog"].is_null());
    assert_eq!(rows(&page).len(), 2);
    assert!(rows(&page).iter().all(|row| row["id"] != "c-1002"));

    let (status, _) = send(&app, Method::POST, "/api/delete/confirm", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_cancel_delete_keeps_entry() {
    let app = signed_in().await;
    send(&app, Method::GET, "/api/entries", None).await;
    send(&app, Method::POST, "/api/entries/c-1003/delete", None).await;

    let (_, page) = send(&app, Method::POST, "/api/delete/cancel", None).await;
    assert!(page["delete_dialog"].is_null());
    assert_eq!(rows(&page).len(), 3);
}

#[tokio::test]
async fn test_switching_to_empty_collection() {
    let app = signed_in().await;

    let (status, page) = send(
        &app,
        Method::PUT,
        "/api/entries/collection",
        Some(json!({ "collection": "enquiries" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["collection"], "enquiries");
    assert_eq!(page["body"]["kind"], "empty");
}

#[tokio::test]
async fn test_sign_out_closes_the_dashboard() {
    let app = signed_in().await;
    send(&app, Method::GET, "/api/entries", None).await;

    let (status, body) = send(&app, Method::DELETE, "/api/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirect"], "/login");

    let (status, _) = send(&app, Method::GET, "/api/entries", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
