//! Application state management

use dkh_admin::{AdminResult, Dashboard};
use dkh_backend::Backend;
use dkh_core::Config;

/// Application state holding configuration and the dashboard components
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Session provider and entries view
    pub dashboard: Dashboard,
}

impl AppState {
    /// Start the dashboard against `backend`
    pub fn new(config: Config, backend: &Backend) -> AdminResult<Self> {
        let dashboard = Dashboard::start(backend, &config.dashboard)?;
        Ok(Self { config, dashboard })
    }
}
