//! Firebase REST clients
//!
//! [`FirebaseAuth`] signs operators in through the Identity Toolkit API and
//! hands its ID token to [`FirestoreStore`] through [`TokenProvider`].

pub mod auth;
pub mod codec;
pub mod firestore;

pub use auth::FirebaseAuth;
pub use firestore::FirestoreStore;

use std::time::Duration;

/// Source of the bearer token attached to store requests
pub trait TokenProvider: Send + Sync {
    /// Current ID token, if an operator is signed in
    fn bearer_token(&self) -> Option<String>;

    /// The store answered 401 to a request carrying this token
    fn token_rejected(&self, _token: &str) {}
}

pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(5))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(10)
        .build()
}

/// Error body shared by the Google REST APIs
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

pub(crate) fn parse_error_body(body: &str) -> Option<ErrorDetail> {
    serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.error)
}
