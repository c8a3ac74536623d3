//! Live mirror of one document collection
//!
//! A [`LiveCollection`] is bound to at most one collection at a time. Each
//! binding gets a new generation number; snapshot callbacks and refresh
//! results carry the generation they were issued for and are dropped when
//! it is no longer current.

use dkh_backend::{BackendError, DocumentStore, Subscription};
use dkh_core::Record;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Mirror state shared between the hook and its subscription callbacks
#[derive(Debug, Clone, PartialEq)]
pub struct Mirror {
    collection: String,
    generation: u64,
    records: Vec<Record>,
    loading: bool,
    error: Option<String>,
    initialized: bool,
}

impl Mirror {
    fn pending(collection: &str, generation: u64) -> Self {
        Self {
            collection: collection.to_string(),
            generation,
            records: Vec::new(),
            loading: true,
            error: None,
            initialized: false,
        }
    }

    /// Binding this state belongs to
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// What consumers may see.
    ///
    /// Until the first snapshot or error arrives the mirror reports
    /// loading with no records and no error.
    pub fn snapshot(&self) -> CollectionSnapshot {
        if self.initialized {
            CollectionSnapshot {
                collection: self.collection.clone(),
                records: self.records.clone(),
                loading: self.loading,
                error: self.error.clone(),
                initialized: true,
            }
        } else {
            CollectionSnapshot {
                collection: self.collection.clone(),
                records: Vec::new(),
                loading: true,
                error: None,
                initialized: false,
            }
        }
    }
}

/// Point-in-time view of a [`LiveCollection`]
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSnapshot {
    /// Bound collection; empty when unbound
    pub collection: String,
    /// Records in store order
    pub records: Vec<Record>,
    /// A read is outstanding
    pub loading: bool,
    /// Message of the last subscription or read failure
    pub error: Option<String>,
    /// A snapshot or an error has arrived for this binding
    pub initialized: bool,
}

impl CollectionSnapshot {
    /// Look up a record by identifier
    pub fn find(&self, id: &dkh_core::DocumentId) -> Option<&Record> {
        self.records.iter().find(|record| &record.id == id)
    }
}

/// Keeps a local copy of a collection in step with the store
pub struct LiveCollection {
    /// Document store
    store: Arc<dyn DocumentStore>,

    /// Mirror state
    state: Arc<watch::Sender<Mirror>>,

    /// The one open subscription. Held while rebinding so bindings never
    /// interleave.
    subscription: Mutex<Option<Subscription>>,
}

impl LiveCollection {
    /// Create an unbound hook
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (sender, _) = watch::channel(Mirror::pending("", 0));
        Self {
            store,
            state: Arc::new(sender),
            subscription: Mutex::new(None),
        }
    }

    /// Bind to `collection`, replacing any previous binding.
    ///
    /// The previous subscription is cancelled before the new one is opened.
    /// An empty name leaves the hook unbound.
    pub fn watch(&self, collection: &str) {
        let mut slot = self.subscription.lock();
        if let Some(previous) = slot.take() {
            previous.cancel();
        }

        let generation = self.next_generation(collection);
        if collection.is_empty() {
            debug!("Empty collection name, not subscribing");
            return;
        }

        let on_change = {
            let state = Arc::clone(&self.state);
            Box::new(move |records: Vec<Record>| apply_snapshot(&state, generation, records))
        };
        let on_error = {
            let state = Arc::clone(&self.state);
            Box::new(move |error: BackendError| apply_error(&state, generation, &error))
        };

        *slot = Some(self.store.subscribe(collection, on_change, on_error));
        info!("Watching collection {} (generation {})", collection, generation);
    }

    /// Cancel the subscription and forget the binding
    pub fn unwatch(&self) {
        let mut slot = self.subscription.lock();
        if let Some(previous) = slot.take() {
            previous.cancel();
            let collection = self.state.borrow().collection.clone();
            self.next_generation(&collection);
            info!("Stopped watching collection {}", collection);
        }
    }

    /// Re-read the whole collection once and replace the mirror.
    ///
    /// Loading is reported for the duration of the read. A failure is
    /// recorded beside the existing records. The result is discarded if the
    /// hook was rebound meanwhile.
    pub async fn refresh(&self) {
        let (collection, generation) = {
            let mirror = self.state.borrow();
            (mirror.collection.clone(), mirror.generation)
        };
        if collection.is_empty() {
            return;
        }

        self.state.send_if_modified(|mirror| {
            if mirror.generation != generation {
                return false;
            }
            mirror.loading = true;
            true
        });

        let result = self.store.read_all(&collection).await;

        self.state.send_if_modified(|mirror| {
            if mirror.generation != generation {
                debug!("Discarding refresh of {} from generation {}", collection, generation);
                return false;
            }
            match result {
                Ok(records) => {
                    mirror.records = records;
                    mirror.error = None;
                }
                Err(e) => {
                    warn!("Refreshing {} failed: {}", collection, e);
                    mirror.error = Some(e.to_string());
                }
            }
            mirror.loading = false;
            true
        });
    }

    /// Current view of the mirror
    pub fn snapshot(&self) -> CollectionSnapshot {
        self.state.borrow().snapshot()
    }

    /// Bound collection name; empty when unbound
    pub fn collection(&self) -> String {
        self.state.borrow().collection.clone()
    }

    /// Whether a subscription is open
    pub fn is_watching(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Receiver notified whenever the mirror changes
    pub fn subscribe(&self) -> watch::Receiver<Mirror> {
        self.state.subscribe()
    }

    fn next_generation(&self, collection: &str) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|mirror| {
            generation = mirror.generation + 1;
            *mirror = Mirror::pending(collection, generation);
        });
        generation
    }
}

fn apply_snapshot(state: &watch::Sender<Mirror>, generation: u64, records: Vec<Record>) {
    state.send_if_modified(|mirror| {
        if mirror.generation != generation {
            return false;
        }
        debug!("Snapshot of {}: {} records", mirror.collection, records.len());
        mirror.records = records;
        mirror.error = None;
        mirror.loading = false;
        mirror.initialized = true;
        true
    });
}

fn apply_error(state: &watch::Sender<Mirror>, generation: u64, error: &BackendError) {
    state.send_if_modified(|mirror| {
        if mirror.generation != generation {
            return false;
        }
        warn!("Subscription to {} failed: {}", mirror.collection, error);
        mirror.error = Some(error.to_string());
        mirror.loading = false;
        mirror.initialized = true;
        true
    });
}

impl Drop for LiveCollection {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.get_mut().take() {
            subscription.cancel();
        }
    }
}

impl std::fmt::Debug for LiveCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveCollection")
            .field("store", &self.store.name())
            .field("mirror", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
