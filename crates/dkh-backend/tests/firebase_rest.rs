//! Firebase REST clients against a local mock server

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use dkh_backend::firebase::TokenProvider;
use dkh_backend::{AuthService, BackendError, DocumentStore, FirebaseAuth, FirestoreStore};
use dkh_core::config::FirebaseConfig;
use dkh_core::{DocumentId, EntryStatus, Fields, Value};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COLLECTION_PATH: &str = r"^/v1/projects/dkh/databases/.+/documents/consultations$";

fn config(server: &MockServer) -> FirebaseConfig {
    FirebaseConfig {
        api_key: "test-key".to_string(),
        project_id: "dkh".to_string(),
        auth_url: server.uri(),
        firestore_url: server.uri(),
        poll_interval_ms: 20,
        request_timeout_secs: 5,
        ..FirebaseConfig::default()
    }
}

fn document(id: &str, name: &str, status: &str) -> serde_json::Value {
    json!({
        "name": format!("projects/dkh/databases/(default)/documents/consultations/{id}"),
        "fields": {
            "name": { "stringValue": name },
            "status": { "stringValue": status }
        }
    })
}

async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({ "email": "op@dkh.in", "returnSecureToken": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-42",
            "email": "op@dkh.in",
            "idToken": "id-token-1",
            "refreshToken": "refresh",
            "expiresIn": "3600"
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sign_in_publishes_session_and_token() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;

    let auth = FirebaseAuth::new(&config(&server)).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let seen = Arc::clone(&seen);
        auth.on_session_change(Box::new(move |session| seen.lock().push(session)))
    };

    let session = auth.authenticate("op@dkh.in", "secret").await.unwrap();

    assert_eq!(session.uid, "uid-42");
    assert_eq!(auth.bearer_token().as_deref(), Some("id-token-1"));
    {
        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], None);
        assert_eq!(seen[1].as_ref().map(|s| s.uid.as_str()), Some("uid-42"));
    }

    auth.terminate().await.unwrap();
    assert_eq!(auth.bearer_token(), None);
    assert_eq!(seen.lock().last(), Some(&None));
}

#[tokio::test]
async fn test_sign_in_rejection_is_readable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "INVALID_LOGIN_CREDENTIALS", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let auth = FirebaseAuth::new(&config(&server)).unwrap();
    let err = auth.authenticate("op@dkh.in", "wrong").await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid email or password.");
    assert_eq!(auth.bearer_token(), None);
}

#[tokio::test]
async fn test_read_all_follows_pages_with_bearer_token() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;

    Mock::given(method("GET"))
        .and(path_regex(COLLECTION_PATH))
        .and(query_param("pageToken", "page-2"))
        .and(header("authorization", "Bearer id-token-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "documents": [document("b", "Rohan", "new")] })),
        )
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(COLLECTION_PATH))
        .and(header("authorization", "Bearer id-token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [document("a", "Asha", "pending")],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;

    let auth = Arc::new(FirebaseAuth::new(&config(&server)).unwrap());
    auth.authenticate("op@dkh.in", "secret").await.unwrap();
    let tokens: Arc<dyn TokenProvider> = auth.clone();
    let store = FirestoreStore::new(&config(&server))
        .unwrap()
        .with_token_provider(tokens);

    let records = store.read_all("consultations").await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id.as_str(), "a");
    assert_eq!(records[1].status(), Some(EntryStatus::New));
}

#[tokio::test]
async fn test_empty_collection_reads_as_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(COLLECTION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(&config(&server)).unwrap();
    assert!(store.read_all("consultations").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_permission_denied_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(COLLECTION_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(&config(&server)).unwrap();
    let err = store.read_all("consultations").await.unwrap_err();

    assert!(matches!(err, BackendError::PermissionDenied { .. }));
}

#[tokio::test]
async fn test_update_sends_mask_and_precondition() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"/documents/consultations/a$"))
        .and(query_param("updateMask.fieldPaths", "status"))
        .and(query_param("currentDocument.exists", "true"))
        .and(body_partial_json(json!({
            "fields": { "status": { "stringValue": "reviewed" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(document("a", "Asha", "reviewed")))
        .expect(1)
        .mount(&server)
        .await;

    let store = FirestoreStore::new(&config(&server)).unwrap();
    let mut fields = Fields::new();
    fields.insert(EntryStatus::FIELD.to_string(), Value::from(EntryStatus::Reviewed));

    store
        .update_fields("consultations", &DocumentId::from("a"), fields)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_of_missing_document_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "No document to update", "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(&config(&server)).unwrap();
    let mut fields = Fields::new();
    fields.insert("status".to_string(), Value::from("new"));

    let err = store
        .update_fields("consultations", &DocumentId::from("gone"), fields)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "No document to update: consultations/gone");
}

#[tokio::test]
async fn test_delete_and_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"/documents/consultations/a$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"/documents/consultations/b$"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(&config(&server)).unwrap();

    store
        .delete("consultations", &DocumentId::from("a"))
        .await
        .unwrap();
    let err = store
        .delete("consultations", &DocumentId::from("b"))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_polling_subscription_delivers_initial_snapshot_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(COLLECTION_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "documents": [document("a", "Asha", "pending")] })),
        )
        .mount(&server)
        .await;

    let store = FirestoreStore::new(&config(&server)).unwrap();
    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let sub = {
        let snapshots = Arc::clone(&snapshots);
        store.subscribe(
            "consultations",
            Box::new(move |records| snapshots.lock().push(records)),
            Box::new(|_| {}),
        )
    };

    // Several poll intervals pass, but the unchanged collection is delivered once.
    tokio::time::sleep(Duration::from_millis(150)).await;
    sub.cancel();

    let snapshots = snapshots.lock();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0][0].id.as_str(), "a");
}

#[tokio::test]
async fn test_polling_failure_reaches_error_listener() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(COLLECTION_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "denied", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(&config(&server)).unwrap();
    let errors = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let errors = Arc::clone(&errors);
        store.subscribe(
            "consultations",
            Box::new(|_| {}),
            Box::new(move |e| errors.lock().push(e.to_string())),
        )
    };

    tokio::time::sleep(Duration::from_millis(150)).await;

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("denied"));
    // Permission errors end the poller.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_polling_recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(COLLECTION_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "code": 503, "message": "backend busy", "status": "UNAVAILABLE" }
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(COLLECTION_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "documents": [document("a", "Asha", "pending")] })),
        )
        .mount(&server)
        .await;

    let store = FirestoreStore::new(&config(&server)).unwrap();
    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sub = {
        let snapshots = Arc::clone(&snapshots);
        let errors = Arc::clone(&errors);
        store.subscribe(
            "consultations",
            Box::new(move |records| snapshots.lock().push(records)),
            Box::new(move |e| errors.lock().push(e.to_string())),
        )
    };

    tokio::time::sleep(Duration::from_millis(400)).await;
    sub.cancel();

    let errors = errors.lock();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("backend busy"));

    let snapshots = snapshots.lock();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0][0].id.as_str(), "a");
    assert!(server.received_requests().await.unwrap().len() > 2);
}

#[tokio::test]
async fn test_rejected_token_signs_operator_out() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(COLLECTION_PATH))
        .and(header("authorization", "Bearer id-token-1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "code": 401,
                "message": "Request had invalid authentication credentials.",
                "status": "UNAUTHENTICATED"
            }
        })))
        .mount(&server)
        .await;

    let auth = Arc::new(FirebaseAuth::new(&config(&server)).unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let _session_sub = {
        let seen = Arc::clone(&seen);
        auth.on_session_change(Box::new(move |session| seen.lock().push(session)))
    };
    auth.authenticate("op@dkh.in", "secret").await.unwrap();

    let tokens: Arc<dyn TokenProvider> = auth.clone();
    let store = FirestoreStore::new(&config(&server))
        .unwrap()
        .with_token_provider(tokens);

    let err = store.read_all("consultations").await.unwrap_err();

    assert!(matches!(err, BackendError::PermissionDenied { .. }));
    assert_eq!(auth.bearer_token(), None);
    let seen = seen.lock();
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[2], None);
}
