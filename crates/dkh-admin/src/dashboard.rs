//! The session provider and entries view wired to one backend

use crate::entries::{DisplayZone, EntriesView, ValueFormatter};
use crate::error::AdminResult;
use crate::nav::NavBar;
use crate::session::SessionProvider;
use dkh_backend::Backend;
use dkh_core::config::DashboardConfig;
use std::sync::Arc;
use tracing::info;

/// Application-wide dashboard state
#[derive(Debug, Clone)]
pub struct Dashboard {
    /// Authentication state
    pub session: Arc<SessionProvider>,

    /// Entries table
    pub entries: Arc<EntriesView>,
}

impl Dashboard {
    /// Start the session provider and create the (unmounted) entries view
    pub fn start(backend: &Backend, config: &DashboardConfig) -> AdminResult<Self> {
        let zone = DisplayZone::from_config(config)?;
        let session = Arc::new(SessionProvider::start(Arc::clone(&backend.auth)));
        let entries = Arc::new(EntriesView::new(
            Arc::clone(&session),
            Arc::clone(&backend.store),
            config.collection.clone(),
            ValueFormatter::new(zone),
        ));

        info!("Dashboard started on collection {}", config.collection);
        Ok(Self { session, entries })
    }

    /// Header for the current session
    pub fn nav(&self) -> NavBar {
        NavBar::from_session(self.session.current_session().as_ref())
    }

    /// Sign out and leave the protected page
    pub async fn sign_out(&self) -> AdminResult<()> {
        self.session.sign_out().await?;
        self.entries.unmount();
        Ok(())
    }

    /// Release every listener registration
    pub fn shutdown(&self) {
        self.entries.unmount();
        self.session.shutdown();
    }
}
