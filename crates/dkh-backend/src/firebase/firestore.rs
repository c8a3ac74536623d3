//! Firestore REST document store

use super::codec::{decode_document, encode_fields};
use super::{TokenProvider, http_client, parse_error_body};
use crate::error::{BackendError, BackendResult};
use crate::service::{DocumentStore, ErrorListener, SnapshotListener};
use crate::subscription::Subscription;
use async_trait::async_trait;
use dkh_core::config::FirebaseConfig;
use dkh_core::{DocumentId, Fields, Record};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

const PAGE_SIZE: u32 = 300;

/// Upper bound on the extra wait after consecutive failed polls
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<serde_json::Value>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Document store backed by the Firestore REST API.
///
/// The REST API has no push channel, so live subscriptions poll the
/// collection and deliver a snapshot whenever its contents change.
#[derive(Clone)]
pub struct FirestoreStore {
    /// HTTP client
    client: reqwest::Client,

    /// `.../projects/{project}/databases/{database}/documents`
    documents_url: String,

    /// Delay between polls of a watched collection
    poll_interval: Duration,

    /// Bearer token source for security rules
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl FirestoreStore {
    /// Create a store for the configured project
    pub fn new(config: &FirebaseConfig) -> BackendResult<Self> {
        let documents_url = format!(
            "{}/v1/projects/{}/databases/{}/documents",
            config.firestore_url.trim_end_matches('/'),
            urlencoding::encode(&config.project_id),
            urlencoding::encode(&config.database_id),
        );

        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            documents_url,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            tokens: None,
        })
    }

    /// Authenticate requests with tokens from `tokens`
    pub fn with_token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.documents_url, urlencoding::encode(collection))
    }

    fn document_url(&self, collection: &str, id: &DocumentId) -> String {
        format!(
            "{}/{}",
            self.collection_url(collection),
            urlencoding::encode(id.as_str())
        )
    }

    /// Send a request with the current bearer token attached.
    ///
    /// A 401 tells the token provider its token is no longer accepted.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> BackendResult<Response> {
        let token = self.tokens.as_ref().and_then(|t| t.bearer_token());

        let mut builder = self.client.request(method, url);
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED
            && let (Some(tokens), Some(token)) = (&self.tokens, &token)
        {
            tokens.token_rejected(token);
        }
        Ok(response)
    }

    async fn list_page(
        &self,
        collection: &str,
        page_token: Option<&str>,
    ) -> BackendResult<ListResponse> {
        let mut url = format!("{}?pageSize={PAGE_SIZE}", self.collection_url(collection));
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }

        let response = check(self.send(Method::GET, &url, None).await?).await?;
        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("documents_url", &self.documents_url)
            .field("poll_interval", &self.poll_interval)
            .field("authenticated", &self.tokens.is_some())
            .finish_non_exhaustive()
    }
}

/// Map a non-success response to a [`BackendError`]
async fn check(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = parse_error_body(&body);
    let message = detail
        .as_ref()
        .map_or_else(|| status.to_string(), |d| d.message.clone());

    Err(match (status, detail.as_ref().map(|d| d.status.as_str())) {
        (StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED, _) | (_, Some("PERMISSION_DENIED")) => {
            BackendError::permission_denied(message)
        }
        (s, _) if s.is_server_error() => BackendError::unavailable(message),
        _ => BackendError::protocol(format!("{status}: {message}")),
    })
}

/// Extra wait before the next poll after `failures` consecutive failures
fn retry_delay(poll_interval: Duration, failures: u32) -> Duration {
    let factor = 1_u32 << failures.saturating_sub(1).min(6);
    poll_interval.saturating_mul(factor).min(MAX_RETRY_DELAY)
}

/// Quote a field path segment unless it is a plain identifier
fn field_path(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn read_all(&self, collection: &str) -> BackendResult<Vec<Record>> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(collection, page_token.as_deref()).await?;
            for document in &page.documents {
                records.push(decode_document(document)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!("Read {} documents from {}", records.len(), collection);
        Ok(records)
    }

    fn subscribe(
        &self,
        collection: &str,
        on_change: SnapshotListener,
        on_error: ErrorListener,
    ) -> Subscription {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            on_error(BackendError::subscription(
                "polling requires a running tokio runtime",
            ));
            return Subscription::inert();
        };

        let store = self.clone();
        let collection = collection.to_string();

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Vec<Record>> = None;
            let mut failures: u32 = 0;

            loop {
                ticker.tick().await;
                match store.read_all(&collection).await {
                    Ok(records) => {
                        if failures > 0 {
                            info!("Polling {} recovered after {} failures", collection, failures);
                            failures = 0;
                        }
                        if last.as_ref() != Some(&records) {
                            on_change(records.clone());
                            last = Some(records);
                        }
                    }
                    Err(e) if e.is_retryable() => {
                        failures = failures.saturating_add(1);
                        warn!("Polling {} failed (attempt {}): {}", collection, failures, e);
                        if failures == 1 {
                            on_error(BackendError::subscription(e.to_string()));
                        }
                        // Redeliver on recovery so the error is cleared.
                        last = None;
                        tokio::time::sleep(retry_delay(store.poll_interval, failures)).await;
                    }
                    Err(e) => {
                        error!("Polling {} stopped: {}", collection, e);
                        on_error(BackendError::subscription(e.to_string()));
                        break;
                    }
                }
            }
        });

        Subscription::new(move || task.abort())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> BackendResult<()> {
        let mut url = format!("{}?currentDocument.exists=true", self.document_url(collection, id));
        for name in fields.keys() {
            url.push_str("&updateMask.fieldPaths=");
            url.push_str(&urlencoding::encode(&field_path(name)));
        }

        let body = serde_json::json!({ "fields": encode_fields(&fields) });
        let response = self.send(Method::PATCH, &url, Some(&body)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!("Update of missing document {}/{}", collection, id);
            return Err(BackendError::not_found(collection, id.as_str()));
        }

        check(response).await?;
        debug!("Updated {}/{}", collection, id);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> BackendResult<()> {
        let url = self.document_url(collection, id);
        check(self.send(Method::DELETE, &url, None).await?).await?;
        debug!("Deleted {}/{}", collection, id);
        Ok(())
    }

    fn name(&self) -> &str {
        "firestore"
    }
}
