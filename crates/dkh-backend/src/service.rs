//! Contracts of the two hosted services the dashboard depends on

use crate::error::{BackendError, BackendResult};
use crate::subscription::Subscription;
use async_trait::async_trait;
use dkh_core::{DocumentId, Fields, Record, Session};

/// Callback receiving the signed-in identity, or `None` when signed out
pub type SessionListener = Box<dyn Fn(Option<Session>) + Send + Sync>;

/// Callback receiving the full current contents of a watched collection
pub type SnapshotListener = Box<dyn Fn(Vec<Record>) + Send + Sync>;

/// Callback receiving a subscription failure
pub type ErrorListener = Box<dyn Fn(BackendError) + Send + Sync>;

/// Email/password authentication service
///
/// Session changes are published through [`AuthService::on_session_change`]
/// only; the return value of `authenticate` is informational.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Sign in with email and password
    async fn authenticate(&self, email: &str, password: &str) -> BackendResult<Session>;

    /// Sign the current operator out
    async fn terminate(&self) -> BackendResult<()>;

    /// Register a listener for session changes.
    ///
    /// The listener is called once with the current state shortly after
    /// registration, then on every change until the handle is cancelled.
    fn on_session_change(&self, listener: SessionListener) -> Subscription;

    /// Get service name
    fn name(&self) -> &str;
}

/// Schemaless collection-of-documents store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// One-shot read of every document in a collection
    async fn read_all(&self, collection: &str) -> BackendResult<Vec<Record>>;

    /// Watch a collection.
    ///
    /// `on_change` receives the whole collection each time it changes,
    /// starting with its current contents. Deliveries for one subscription
    /// arrive in the order the store produced them.
    fn subscribe(
        &self,
        collection: &str,
        on_change: SnapshotListener,
        on_error: ErrorListener,
    ) -> Subscription;

    /// Overwrite the given fields of an existing document
    async fn update_fields(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> BackendResult<()>;

    /// Delete a document
    async fn delete(&self, collection: &str, id: &DocumentId) -> BackendResult<()>;

    /// Get store name
    fn name(&self) -> &str;
}
