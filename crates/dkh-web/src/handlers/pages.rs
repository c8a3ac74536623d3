//! Page handlers for serving HTML templates

use crate::state::AppState;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use dkh_admin::Access;
use std::sync::Arc;

/// Dashboard page; visitors without a session are sent to the login page
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    match state.dashboard.session.access() {
        Access::Denied => Redirect::to("/login").into_response(),
        Access::Pending | Access::Granted(_) => {
            Html(include_str!("../../templates/dashboard.html")).into_response()
        }
    }
}

/// Login page; a signed-in operator goes straight to the dashboard
pub async fn login(State(state): State<Arc<AppState>>) -> Response {
    match state.dashboard.session.access() {
        Access::Granted(_) => Redirect::to("/").into_response(),
        Access::Pending | Access::Denied => {
            Html(include_str!("../../templates/login.html")).into_response()
        }
    }
}
