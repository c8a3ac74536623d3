//! Route definitions for the web interface

use crate::{
    handlers::{api, pages},
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

/// Build the complete web application router
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Page routes
        .route("/", get(pages::dashboard))
        .route("/login", get(pages::login))
        // Session
        .route(
            "/api/session",
            get(api::session_state)
                .post(api::sign_in)
                .delete(api::sign_out),
        )
        // Entries
        .route("/api/entries", get(api::entries))
        .route("/api/entries/collection", put(api::set_collection))
        .route("/api/entries/refresh", post(api::refresh))
        .route("/api/entries/:id/status", put(api::change_status))
        .route("/api/entries/:id/delete", post(api::request_delete))
        .route("/api/delete/confirm", post(api::confirm_delete))
        .route("/api/delete/cancel", post(api::cancel_delete))
        // WebSocket for live updates
        .route("/ws", get(api::websocket_handler))
        // Health check
        .route("/health", get(api::health_check))
}
