//! Process-wide authentication state
//!
//! [`SessionProvider`] owns the single listener registration with the auth
//! service for as long as it lives. The signed-in identity changes only when
//! the service announces it; `sign_in` and `sign_out` merely ask for a change
//! and record a failure message when the request is rejected.

use crate::error::AdminResult;
use dkh_backend::{AuthService, Subscription};
use dkh_core::Session;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Where the provider is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum AuthPhase {
    /// No notification received yet
    Initializing,
    /// An operator is signed in
    Authenticated {
        /// The operator's identity
        session: Session,
    },
    /// Nobody is signed in
    Unauthenticated,
}

/// Observable provider state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    /// Lifecycle phase
    #[serde(flatten)]
    pub phase: AuthPhase,

    /// Message of the last failed sign-in or sign-out
    pub error: Option<String>,
}

impl SessionState {
    /// Signed-in identity, if any
    pub const fn session(&self) -> Option<&Session> {
        match &self.phase {
            AuthPhase::Authenticated { session } => Some(session),
            _ => None,
        }
    }

    /// Whether the first notification is still outstanding
    pub const fn is_loading(&self) -> bool {
        matches!(self.phase, AuthPhase::Initializing)
    }

    /// Route-protection decision for this state
    pub fn access(&self) -> Access {
        match &self.phase {
            AuthPhase::Initializing => Access::Pending,
            AuthPhase::Authenticated { session } => Access::Granted(session.clone()),
            AuthPhase::Unauthenticated => Access::Denied,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: AuthPhase::Initializing,
            error: None,
        }
    }
}

/// Outcome of guarding a protected page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Session state is not known yet; show a loading indicator
    Pending,
    /// The operator may see the page
    Granted(Session),
    /// Send the visitor to the login page
    Denied,
}

/// Holds the authentication state for the whole application
pub struct SessionProvider {
    /// Auth service
    auth: Arc<dyn AuthService>,

    /// Current state, shared with the change listener
    state: Arc<watch::Sender<SessionState>>,

    /// Listener registration; `None` after shutdown
    registration: Mutex<Option<Subscription>>,
}

impl SessionProvider {
    /// Register with the auth service and start tracking its session.
    ///
    /// The registration is removed by [`SessionProvider::shutdown`] or when
    /// the provider is dropped.
    pub fn start(auth: Arc<dyn AuthService>) -> Self {
        let (sender, _) = watch::channel(SessionState::default());
        let state = Arc::new(sender);

        let registration = {
            let state = Arc::clone(&state);
            auth.on_session_change(Box::new(move |session| {
                debug!("Session changed: {:?}", session.as_ref().map(|s| &s.uid));
                state.send_modify(|current| {
                    current.phase = match session {
                        Some(session) => AuthPhase::Authenticated { session },
                        None => AuthPhase::Unauthenticated,
                    };
                });
            }))
        };

        info!("Session provider registered with {}", auth.name());

        Self {
            auth,
            state,
            registration: Mutex::new(Some(registration)),
        }
    }

    /// Request a sign-in.
    ///
    /// Clears the stored error first. On rejection the message is stored and
    /// the error is returned as well.
    pub async fn sign_in(&self, email: &str, password: &str) -> AdminResult<()> {
        self.clear_error();
        match self.auth.authenticate(email, password).await {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!("Sign-in failed for {}: {}", email, e);
                self.set_error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Request a sign-out, with the same error handling as `sign_in`
    pub async fn sign_out(&self) -> AdminResult<()> {
        self.clear_error();
        match self.auth.terminate().await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("Sign-out failed: {}", e);
                self.set_error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Signed-in identity, if any
    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    /// Whether the auth service has not reported yet
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Message of the last failed request
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Copy of the whole state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Route-protection decision for the current state
    pub fn access(&self) -> Access {
        self.state.borrow().access()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Remove the listener registration. Later notifications are ignored.
    pub fn shutdown(&self) {
        if let Some(registration) = self.registration.lock().take() {
            registration.cancel();
            info!("Session provider shut down");
        }
    }

    /// Whether the provider still listens to the auth service
    pub fn is_running(&self) -> bool {
        self.registration.lock().is_some()
    }

    fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    fn set_error(&self, message: String) {
        self.state.send_modify(|state| state.error = Some(message));
    }
}

impl std::fmt::Debug for SessionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionProvider")
            .field("auth", &self.auth.name())
            .field("state", &*self.state.borrow())
            .field("running", &self.is_running())
            .finish()
    }
}
