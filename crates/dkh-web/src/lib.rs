//! DKH Admin web interface
//!
//! Serves the login and dashboard pages, a JSON API for session and entry
//! actions, and a websocket that pushes the rendered entries page whenever
//! it changes.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

// Re-export the main functions
pub use server::build_app;
pub use state::AppState;
