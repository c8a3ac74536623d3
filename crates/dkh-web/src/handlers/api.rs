//! JSON API and websocket handlers

use super::error::ApiError;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::{Json, Response},
};
use dkh_admin::{Access, AdminError, EntriesPage, NavBar, SessionState};
use dkh_core::{DocumentId, EntryStatus};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::{debug, error, info};

/// Result of an API handler
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Session state together with the header built from it
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    /// Provider state
    #[serde(flatten)]
    pub state: SessionState,
    /// Page header
    pub nav: NavBar,
}

/// Sign-in form
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

/// Where to go after signing out
#[derive(Debug, Serialize)]
pub struct SignOutResponse {
    /// Page to load next
    pub redirect: &'static str,
}

/// Collection switch request
#[derive(Debug, Deserialize)]
pub struct CollectionRequest {
    /// Collection to show
    pub collection: String,
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// New status
    pub status: EntryStatus,
}

/// Frame pushed over the websocket
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "dashboard")]
pub struct DashboardFrame {
    /// Session state and header
    pub session: SessionResponse,
    /// Rendered entries, absent while the view is gated
    pub page: Option<EntriesPage>,
}

fn session_response(state: &AppState) -> SessionResponse {
    SessionResponse {
        state: state.dashboard.session.state(),
        nav: state.dashboard.nav(),
    }
}

/// Mount the entries view for a signed-in operator, reject everyone else
fn require_session(state: &AppState) -> Result<(), ApiError> {
    match state.dashboard.session.access() {
        Access::Granted(_) => {
            state.dashboard.entries.mount();
            Ok(())
        }
        Access::Pending | Access::Denied => Err(AdminError::NotSignedIn.into()),
    }
}

fn rendered(state: &AppState) -> Json<Option<EntriesPage>> {
    Json(state.dashboard.entries.render())
}

/// Current session state
pub async fn session_state(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    Json(session_response(&state))
}

/// Sign in with email and password
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignInRequest>,
) -> ApiResult<SessionResponse> {
    state
        .dashboard
        .session
        .sign_in(&request.email, &request.password)
        .await?;
    info!("Operator {} signed in", request.email);
    Ok(Json(session_response(&state)))
}

/// Sign out and leave the dashboard
pub async fn sign_out(State(state): State<Arc<AppState>>) -> ApiResult<SignOutResponse> {
    state.dashboard.sign_out().await?;
    Ok(Json(SignOutResponse { redirect: "/login" }))
}

/// Rendered entries page
pub async fn entries(State(state): State<Arc<AppState>>) -> ApiResult<Option<EntriesPage>> {
    require_session(&state)?;
    Ok(rendered(&state))
}

/// Switch collection
pub async fn set_collection(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CollectionRequest>,
) -> ApiResult<Option<EntriesPage>> {
    require_session(&state)?;
    state
        .dashboard
        .entries
        .set_collection(request.collection.trim());
    Ok(rendered(&state))
}

/// Re-read the active collection
pub async fn refresh(State(state): State<Arc<AppState>>) -> ApiResult<Option<EntriesPage>> {
    require_session(&state)?;
    state.dashboard.entries.refresh().await;
    Ok(rendered(&state))
}

/// Change an entry's status
pub async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Option<EntriesPage>> {
    require_session(&state)?;
    state
        .dashboard
        .entries
        .change_status(&DocumentId::new(id), request.status)
        .await?;
    Ok(rendered(&state))
}

/// Open the delete dialog for an entry
pub async fn request_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Option<EntriesPage>> {
    require_session(&state)?;
    state
        .dashboard
        .entries
        .request_delete(&DocumentId::new(id))?;
    Ok(rendered(&state))
}

/// Confirm the pending deletion
pub async fn confirm_delete(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Option<EntriesPage>> {
    require_session(&state)?;
    state.dashboard.entries.confirm_delete().await?;
    Ok(rendered(&state))
}

/// Close the delete dialog
pub async fn cancel_delete(State(state): State<Arc<AppState>>) -> ApiResult<Option<EntriesPage>> {
    require_session(&state)?;
    state.dashboard.entries.cancel_delete();
    Ok(rendered(&state))
}

/// WebSocket handler for live updates
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| websocket_connection(socket, state))
}

fn frame(state: &AppState) -> Option<String> {
    if matches!(state.dashboard.session.access(), Access::Granted(_)) {
        state.dashboard.entries.mount();
    }

    let frame = DashboardFrame {
        session: session_response(state),
        page: state.dashboard.entries.render(),
    };
    match serde_json::to_string(&frame) {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to encode dashboard frame: {}", e);
            None
        }
    }
}

/// Push a frame now and after every change until the client leaves
async fn websocket_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut changes = state.dashboard.entries.changes();
    let mut ping_interval = interval(Duration::from_secs(30));

    info!("WebSocket connection established");

    if let Some(text) = frame(&state)
        && sender.send(Message::Text(text)).await.is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            alive = changes.changed() => {
                if !alive {
                    break;
                }
                if let Some(text) = frame(&state)
                    && sender.send(Message::Text(text)).await.is_err()
                {
                    break;
                }
            }
            _ = ping_interval.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    Some(Ok(other)) => debug!("Ignoring websocket message {:?}", other),
                }
            }
        }
    }

    info!("WebSocket connection closed");
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
