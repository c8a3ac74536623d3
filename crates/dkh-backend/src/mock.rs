//! In-memory auth service and document store for tests and local runs

use crate::error::{BackendError, BackendResult};
use crate::service::{
    AuthService, DocumentStore, ErrorListener, SessionListener, SnapshotListener,
};
use crate::subscription::{Listeners, Subscription};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use dkh_core::{DocumentId, EntryStatus, Fields, Record, Session, Value};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
struct MockAccount {
    uid: String,
    password: String,
}

/// Mock auth service holding a fixed set of accounts
#[derive(Debug)]
pub struct MockAuthService {
    /// Accounts by email
    accounts: Mutex<HashMap<String, MockAccount>>,

    /// Signed-in identity
    current: Mutex<Option<Session>>,

    /// Session change listeners
    listeners: Listeners<Option<Session>>,

    /// Deliver the current state to new listeners immediately
    announce_on_register: bool,

    /// Sign-out failure to inject
    sign_out_failure: Mutex<Option<String>>,
}

impl MockAuthService {
    /// Create a mock with no accounts
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            listeners: Listeners::new(),
            announce_on_register: true,
            sign_out_failure: Mutex::new(None),
        }
    }

    /// Add an account
    #[must_use]
    pub fn with_account(self, email: impl Into<String>, password: impl Into<String>) -> Self {
        let email = email.into();
        let uid = format!("uid-{}", email.split('@').next().unwrap_or_default());
        self.accounts.lock().insert(
            email,
            MockAccount {
                uid,
                password: password.into(),
            },
        );
        self
    }

    /// Start with the given account already signed in
    #[must_use]
    pub fn signed_in_as(self, email: &str) -> Self {
        let session = self
            .accounts
            .lock()
            .get(email)
            .map(|account| Session::new(account.uid.clone(), Some(email.to_string())));
        *self.current.lock() = session;
        self
    }

    /// Hold back the initial state until [`MockAuthService::announce`] is called
    #[must_use]
    pub const fn with_deferred_state(mut self) -> Self {
        self.announce_on_register = false;
        self
    }

    /// Make the next sign-outs fail
    pub fn fail_sign_out(&self, message: impl Into<String>) {
        *self.sign_out_failure.lock() = Some(message.into());
    }

    /// Deliver the current state to every listener
    pub fn announce(&self) {
        let current = self.current.lock().clone();
        self.listeners.emit(&current);
    }

    /// Number of registered session listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Signed-in identity as the service sees it
    pub fn current_session(&self) -> Option<Session> {
        self.current.lock().clone()
    }

    fn set_current(&self, session: Option<Session>) {
        *self.current.lock() = session.clone();
        self.listeners.emit(&session);
    }
}

impl Default for MockAuthService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthService for MockAuthService {
    async fn authenticate(&self, email: &str, password: &str) -> BackendResult<Session> {
        if email.trim().is_empty() {
            return Err(BackendError::authentication(
                "INVALID_EMAIL",
                "The email address is badly formatted.",
            ));
        }

        let account = self.accounts.lock().get(email).cloned();
        match account {
            Some(account) if account.password == password => {
                let session = Session::new(account.uid, Some(email.to_string()));
                debug!("Mock sign-in for {}", email);
                self.set_current(Some(session.clone()));
                Ok(session)
            }
            _ => Err(BackendError::authentication(
                "INVALID_LOGIN_CREDENTIALS",
                "Invalid email or password.",
            )),
        }
    }

    async fn terminate(&self) -> BackendResult<()> {
        if let Some(message) = self.sign_out_failure.lock().clone() {
            return Err(BackendError::unavailable(message));
        }
        self.set_current(None);
        Ok(())
    }

    fn on_session_change(&self, listener: SessionListener) -> Subscription {
        let listener: Arc<SessionListener> = Arc::new(listener);
        let subscription = {
            let listener = Arc::clone(&listener);
            self.listeners.add(move |session| listener(session.clone()))
        };

        if self.announce_on_register {
            let current = self.current.lock().clone();
            listener(current);
        }

        subscription
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A call received by [`MockDocumentStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    /// One-shot read
    ReadAll {
        /// Collection name
        collection: String,
    },
    /// Live subscription opened
    Subscribe {
        /// Collection name
        collection: String,
    },
    /// Partial update
    Update {
        /// Collection name
        collection: String,
        /// Document identifier
        id: DocumentId,
        /// Fields written
        fields: Fields,
    },
    /// Deletion
    Delete {
        /// Collection name
        collection: String,
        /// Document identifier
        id: DocumentId,
    },
}

enum Delivery {
    Snapshot(Vec<Record>),
    Failure(String),
}

#[derive(Debug, Default)]
struct Failures {
    read: Option<String>,
    update: Option<String>,
    delete: Option<String>,
}

/// Mock document store keeping collections in memory.
///
/// By default it behaves like the hosted store: a new subscription receives
/// the current contents immediately and every mutation is pushed to the
/// collection's subscribers. With [`MockDocumentStore::with_manual_delivery`]
/// nothing is pushed until a test calls [`MockDocumentStore::push_snapshot`]
/// or [`MockDocumentStore::push_error`].
pub struct MockDocumentStore {
    /// Documents by collection, in insertion order
    collections: Mutex<HashMap<String, Vec<Record>>>,

    /// Subscribers by collection
    watchers: Mutex<HashMap<String, Listeners<Delivery>>>,

    /// Every call received, in order
    calls: Mutex<Vec<StoreCall>>,

    /// Injected failures
    failures: Mutex<Failures>,

    /// Push nothing on its own
    manual_delivery: bool,
}

impl MockDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            watchers: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Failures::default()),
            manual_delivery: false,
        }
    }

    /// Seed a collection
    #[must_use]
    pub fn with_records(self, collection: impl Into<String>, records: Vec<Record>) -> Self {
        self.collections.lock().insert(collection.into(), records);
        self
    }

    /// Only deliver snapshots when asked to
    #[must_use]
    pub const fn with_manual_delivery(mut self) -> Self {
        self.manual_delivery = true;
        self
    }

    /// Add or replace a document
    pub fn insert(&self, collection: &str, record: Record) {
        {
            let mut collections = self.collections.lock();
            let docs = collections.entry(collection.to_string()).or_default();
            match docs.iter_mut().find(|doc| doc.id == record.id) {
                Some(existing) => *existing = record,
                None => docs.push(record),
            }
        }
        self.auto_push(collection);
    }

    /// Replace a collection's contents wholesale
    pub fn replace_all(&self, collection: &str, records: Vec<Record>) {
        self.collections
            .lock()
            .insert(collection.to_string(), records);
        self.auto_push(collection);
    }

    /// Current contents of a collection
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Make one-shot reads fail
    pub fn fail_reads(&self, message: impl Into<String>) {
        self.failures.lock().read = Some(message.into());
    }

    /// Make updates fail
    pub fn fail_updates(&self, message: impl Into<String>) {
        self.failures.lock().update = Some(message.into());
    }

    /// Make deletions fail
    pub fn fail_deletes(&self, message: impl Into<String>) {
        self.failures.lock().delete = Some(message.into());
    }

    /// Remove every injected failure
    pub fn clear_failures(&self) {
        *self.failures.lock() = Failures::default();
    }

    /// Send the current contents to the collection's subscribers
    pub fn push_snapshot(&self, collection: &str) {
        let records = self.records(collection);
        self.deliver(collection, &Delivery::Snapshot(records));
    }

    /// Send a subscription failure to the collection's subscribers
    pub fn push_error(&self, collection: &str, message: impl Into<String>) {
        self.deliver(collection, &Delivery::Failure(message.into()));
    }

    /// Number of open subscriptions on a collection
    pub fn subscriber_count(&self, collection: &str) -> usize {
        self.watchers
            .lock()
            .get(collection)
            .map_or(0, Listeners::len)
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record_call(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }

    fn deliver(&self, collection: &str, delivery: &Delivery) {
        let watchers = self.watchers.lock().get(collection).cloned();
        if let Some(watchers) = watchers {
            watchers.emit(delivery);
        }
    }

    fn auto_push(&self, collection: &str) {
        if !self.manual_delivery {
            self.push_snapshot(collection);
        }
    }
}

impl Default for MockDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDocumentStore")
            .field("collections", &self.collections.lock().len())
            .field("manual_delivery", &self.manual_delivery)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn read_all(&self, collection: &str) -> BackendResult<Vec<Record>> {
        self.record_call(StoreCall::ReadAll {
            collection: collection.to_string(),
        });

        if let Some(message) = self.failures.lock().read.clone() {
            return Err(BackendError::unavailable(message));
        }

        Ok(self.records(collection))
    }

    fn subscribe(
        &self,
        collection: &str,
        on_change: SnapshotListener,
        on_error: ErrorListener,
    ) -> Subscription {
        self.record_call(StoreCall::Subscribe {
            collection: collection.to_string(),
        });

        let on_change: Arc<SnapshotListener> = Arc::new(on_change);
        let watchers = self
            .watchers
            .lock()
            .entry(collection.to_string())
            .or_default()
            .clone();

        let subscription = {
            let on_change = Arc::clone(&on_change);
            watchers.add(move |delivery| match delivery {
                Delivery::Snapshot(records) => on_change(records.clone()),
                Delivery::Failure(message) => on_error(BackendError::subscription(message.clone())),
            })
        };

        if !self.manual_delivery {
            on_change(self.records(collection));
        }

        subscription
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
    ) -> BackendResult<()> {
        self.record_call(StoreCall::Update {
            collection: collection.to_string(),
            id: id.clone(),
            fields: fields.clone(),
        });

        if let Some(message) = self.failures.lock().update.clone() {
            return Err(BackendError::unavailable(message));
        }

        {
            let mut collections = self.collections.lock();
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|doc| &doc.id == id))
                .ok_or_else(|| BackendError::not_found(collection, id.as_str()))?;
            doc.fields.extend(fields);
        }

        self.auto_push(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> BackendResult<()> {
        self.record_call(StoreCall::Delete {
            collection: collection.to_string(),
            id: id.clone(),
        });

        if let Some(message) = self.failures.lock().delete.clone() {
            return Err(BackendError::unavailable(message));
        }

        // Deleting a missing document is not an error for the hosted store
        // either.
        if let Some(docs) = self.collections.lock().get_mut(collection) {
            docs.retain(|doc| &doc.id != id);
        }

        self.auto_push(collection);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Sample consultation requests for local runs
pub fn sample_consultations() -> Vec<Record> {
    let base = Utc
        .with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .unwrap_or_else(Utc::now);

    let entry = |id: &str, name: &str, message: &str, hours: i64, status: EntryStatus| {
        Record::new(id, Fields::new())
            .with_field("name", name)
            .with_field("message", message)
            .with_field("createdAt", Value::Timestamp(base + Duration::hours(hours)))
            .with_field("email", format!("{}@example.com", name.to_lowercase().replace(' ', ".")))
            .with_field("status", status)
    };

    vec![
        entry(
            "c-1001",
            "Asha Verma",
            "Kitchen remodel, L-shaped layout",
            0,
            EntryStatus::New,
        )
        .with_field("phone", "+91 98100 00001")
        .with_field("address", "12 Lodhi Road, New Delhi"),
        entry(
            "c-1002",
            "Rohan Mehta",
            "Modular wardrobe quote",
            26,
            EntryStatus::Pending,
        )
        .with_field("phone", "+91 98100 00002"),
        entry(
            "c-1003",
            "Neha Kapoor",
            "Follow-up on countertop samples",
            73,
            EntryStatus::Reviewed,
        )
        .with_field("address", "4 MG Road, Gurugram"),
    ]
}
