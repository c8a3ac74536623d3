//! Email/password sign-in against the Identity Toolkit REST API

use super::{TokenProvider, http_client, parse_error_body};
use crate::error::{BackendError, BackendResult};
use crate::service::{AuthService, SessionListener};
use crate::subscription::{Listeners, Subscription};
use async_trait::async_trait;
use dkh_core::Session;
use dkh_core::config::FirebaseConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
}

#[derive(Debug, Clone)]
struct SignedIn {
    session: Session,
    id_token: String,
}

/// Firebase Authentication client.
///
/// Sign-out is local: the ID token is dropped and listeners are told the
/// operator is gone.
pub struct FirebaseAuth {
    /// HTTP client
    client: reqwest::Client,

    /// Identity Toolkit base URL
    auth_url: String,

    /// Project web API key
    api_key: String,

    /// Current sign-in, if any
    state: RwLock<Option<SignedIn>>,

    /// Session change listeners
    listeners: Listeners<Option<Session>>,
}

impl FirebaseAuth {
    /// Create a client for the configured project
    pub fn new(config: &FirebaseConfig) -> BackendResult<Self> {
        Ok(Self {
            client: http_client(config.request_timeout_secs)?,
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            state: RwLock::new(None),
            listeners: Listeners::new(),
        })
    }

    fn current(&self) -> Option<Session> {
        self.state.read().as_ref().map(|s| s.session.clone())
    }

    fn publish(&self, signed_in: Option<SignedIn>) {
        let session = signed_in.as_ref().map(|s| s.session.clone());
        *self.state.write() = signed_in;
        self.listeners.emit(&session);
    }
}

impl std::fmt::Debug for FirebaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseAuth")
            .field("auth_url", &self.auth_url)
            .field("signed_in", &self.state.read().is_some())
            .finish_non_exhaustive()
    }
}

/// Translate an Identity Toolkit error code into an operator-facing error
fn sign_in_error(raw_message: &str) -> BackendError {
    // Messages look like "TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account..."
    let code = raw_message
        .split(" : ")
        .next()
        .unwrap_or(raw_message)
        .trim();

    let message = match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password."
        }
        "INVALID_EMAIL" => "The email address is badly formatted.",
        "MISSING_PASSWORD" => "Password is required.",
        "USER_DISABLED" => "This account has been disabled.",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "Too many failed attempts. Try again later.",
        other => other,
    };

    BackendError::authentication(code, message)
}

#[async_trait]
impl AuthService for FirebaseAuth {
    async fn authenticate(&self, email: &str, password: &str) -> BackendResult<Session> {
        let url = format!(
            "{}/v1/accounts:signInWithPassword?key={}",
            self.auth_url,
            urlencoding::encode(&self.api_key)
        );

        debug!("Signing in {} via {}", email, self.auth_url);

        let response = self
            .client
            .post(&url)
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(BackendError::unavailable(format!(
                    "sign-in returned {status}"
                )));
            }
            let detail = parse_error_body(&body)
                .ok_or_else(|| BackendError::protocol(format!("sign-in returned {status}")))?;
            warn!("Sign-in rejected for {}: {}", email, detail.message);
            return Err(sign_in_error(&detail.message));
        }

        let body: SignInResponse = response.json().await?;
        let session = Session::new(body.local_id, body.email.or_else(|| Some(email.to_string())));

        info!("Operator {} signed in", email);
        self.publish(Some(SignedIn {
            session: session.clone(),
            id_token: body.id_token,
        }));

        Ok(session)
    }

    async fn terminate(&self) -> BackendResult<()> {
        if self.state.read().is_some() {
            info!("Operator signed out");
        }
        self.publish(None);
        Ok(())
    }

    fn on_session_change(&self, listener: SessionListener) -> Subscription {
        let listener: Arc<SessionListener> = Arc::new(listener);
        let subscription = {
            let listener = Arc::clone(&listener);
            self.listeners.add(move |session| listener(session.clone()))
        };
        listener(self.current());
        subscription
    }

    fn name(&self) -> &str {
        "firebase-auth"
    }
}

impl TokenProvider for FirebaseAuth {
    fn bearer_token(&self) -> Option<String> {
        self.state.read().as_ref().map(|s| s.id_token.clone())
    }

    /// An expired or revoked ID token ends the session
    fn token_rejected(&self, token: &str) {
        let current = self
            .state
            .read()
            .as_ref()
            .is_some_and(|s| s.id_token == token);
        if current {
            warn!("ID token rejected by the store, signing out");
            self.publish(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sign_in_error_codes() {
        assert_eq!(
            sign_in_error("INVALID_LOGIN_CREDENTIALS").to_string(),
            "Invalid email or password."
        );
        assert_eq!(
            sign_in_error("TOO_MANY_ATTEMPTS_TRY_LATER : Access to this account has been temporarily disabled")
                .to_string(),
            "Too many failed attempts. Try again later."
        );
        assert_eq!(sign_in_error("WEAK_PASSWORD").to_string(), "WEAK_PASSWORD");
    }

    #[test]
    fn test_sign_in_error_keeps_code() {
        assert!(matches!(
            sign_in_error("USER_DISABLED"),
            BackendError::Authentication { ref code, .. } if code == "USER_DISABLED"
        ));
    }
}
