//! Selection of the service implementations from configuration

use crate::error::BackendResult;
use crate::firebase::{FirebaseAuth, FirestoreStore, TokenProvider};
use crate::mock::{MockAuthService, MockDocumentStore, sample_consultations};
use crate::service::{AuthService, DocumentStore};
use dkh_core::Config;
use dkh_core::config::BackendKind;
use std::sync::Arc;
use tracing::info;

/// The auth service and document store the dashboard runs against
#[derive(Clone)]
pub struct Backend {
    /// Auth service
    pub auth: Arc<dyn AuthService>,

    /// Document store
    pub store: Arc<dyn DocumentStore>,
}

impl Backend {
    /// Pair an auth service with a document store
    pub fn new(auth: Arc<dyn AuthService>, store: Arc<dyn DocumentStore>) -> Self {
        Self { auth, store }
    }

    /// Build the backend selected by `config.backend.kind`
    pub fn from_config(config: &Config) -> BackendResult<Self> {
        let backend = match config.backend.kind {
            BackendKind::Firebase => {
                let auth = Arc::new(FirebaseAuth::new(&config.firebase)?);
                let tokens: Arc<dyn TokenProvider> = auth.clone();
                let store = FirestoreStore::new(&config.firebase)?.with_token_provider(tokens);
                Self::new(auth, Arc::new(store))
            }
            BackendKind::Memory => {
                let auth = MockAuthService::new().with_account(
                    config.memory.operator_email.clone(),
                    config.memory.operator_password.clone(),
                );
                let mut store = MockDocumentStore::new();
                if config.memory.seed_demo_data {
                    store = store.with_records(
                        config.dashboard.collection.clone(),
                        sample_consultations(),
                    );
                }
                Self::new(Arc::new(auth), Arc::new(store))
            }
        };

        info!(
            "Using {} auth and {} store",
            backend.auth.name(),
            backend.store.name()
        );
        Ok(backend)
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("auth", &self.auth.name())
            .field("store", &self.store.name())
            .finish()
    }
}
