//! Cancellable listener registrations

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// Handle to a registered listener.
///
/// Cancelling the handle, explicitly or by dropping it, removes exactly the
/// listener it was issued for. Cancellation is idempotent.
#[must_use = "dropping a Subscription cancels it immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a handle that runs `cancel` once when cancelled or dropped
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Whether cancelling this handle would still remove something
    pub const fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Cancel the registration now
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct ListenerTable<T> {
    next_id: u64,
    entries: Vec<(u64, Callback<T>)>,
}

/// Registry of callbacks that all receive every emitted event.
///
/// Callbacks are invoked outside the registry lock, so a callback may
/// register or cancel listeners without deadlocking.
pub struct Listeners<T> {
    table: Arc<Mutex<ListenerTable<T>>>,
}

impl<T: 'static> Listeners<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(ListenerTable {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a callback; the returned handle removes it again
    pub fn add(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut table = self.table.lock();
            let id = table.next_id;
            table.next_id += 1;
            table.entries.push((id, Arc::new(callback)));
            id
        };

        let table: Weak<Mutex<ListenerTable<T>>> = Arc::downgrade(&self.table);
        Subscription::new(move || {
            if let Some(table) = table.upgrade() {
                table.lock().entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Deliver an event to every registered callback, in registration order
    pub fn emit(&self, event: &T) {
        let callbacks: Vec<Callback<T>> = self
            .table
            .lock()
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    /// Number of live registrations
    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    /// Whether no callback is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Listeners<T> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<T> fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.table.lock().entries.len())
            .finish()
    }
}
