//! Entries table with inline status changes and guarded deletion

use super::columns::{DISPLAY_COLUMNS, ProjectedEntry, headers};
use super::format::ValueFormatter;
use crate::collection::{LiveCollection, Mirror};
use crate::error::{AdminError, AdminResult};
use crate::session::{SessionProvider, SessionState};
use dkh_backend::DocumentStore;
use dkh_core::{DocumentId, EntryStatus, Fields, Value};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Text shown while a read is outstanding
pub const LOADING_MESSAGE: &str = "Loading entries...";

const DELETE_TITLE: &str = "Are you sure?";
const DELETE_DESCRIPTION: &str =
    "This action cannot be undone. This will permanently delete the entry from the database.";

/// View state that lives only in this process
#[derive(Debug, Clone, Default, PartialEq)]
struct LocalState {
    /// The first mount pass has run
    mounted: bool,

    /// Collection the operator is looking at
    collection: String,

    /// Statuses picked in the selector, shown until the store confirms them
    selections: HashMap<DocumentId, EntryStatus>,

    /// Entry awaiting delete confirmation
    delete_candidate: Option<ProjectedEntry>,
}

/// Everything needed to draw the entries card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntriesPage {
    /// Active collection
    pub collection: String,
    /// Column headers, ending with the actions column
    pub headers: Vec<String>,
    /// Error banner text
    pub error_banner: Option<String>,
    /// Card body
    pub body: EntriesBody,
    /// Choices of the status selector
    pub status_options: Vec<StatusOption>,
    /// Open confirmation dialog
    pub delete_dialog: Option<DeleteDialog>,
}

/// Main content of the entries card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntriesBody {
    /// Spinner
    Loading {
        /// Spinner caption
        message: String,
    },
    /// Table rows
    Table {
        /// One row per record, in store order
        rows: Vec<TableRow>,
    },
    /// No records to show
    Empty {
        /// Message naming the collection
        message: String,
    },
    /// Nothing but the error banner
    Unavailable,
}

/// One rendered record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    /// Document identifier
    pub id: String,
    /// Cell text, one per display column
    pub cells: Vec<String>,
    /// Value shown in the status selector
    pub status: Option<String>,
}

/// Choice in the status selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusOption {
    /// Stored value
    pub value: &'static str,
    /// Label
    pub label: &'static str,
}

/// Delete confirmation dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteDialog {
    /// Entry to delete
    pub id: String,
    /// Dialog title
    pub title: &'static str,
    /// Warning text
    pub description: &'static str,
    /// Confirm button label
    pub confirm_label: &'static str,
    /// Cancel button label
    pub cancel_label: &'static str,
}

impl DeleteDialog {
    fn for_entry(entry: &ProjectedEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            title: DELETE_TITLE,
            description: DELETE_DESCRIPTION,
            confirm_label: "Delete",
            cancel_label: "Cancel",
        }
    }
}

/// Message for an empty collection
pub fn empty_message(collection: &str) -> String {
    format!("No entries found in the \"{collection}\" collection.")
}

/// Entries table bound to the session and one live collection
pub struct EntriesView {
    /// Session gate
    session: Arc<SessionProvider>,

    /// Store used for mutations
    store: Arc<dyn DocumentStore>,

    /// Mirror of the active collection
    live: LiveCollection,

    /// Cell text
    formatter: ValueFormatter,

    /// Local view state
    local: watch::Sender<LocalState>,
}

impl EntriesView {
    /// Create an unmounted view of `collection`
    pub fn new(
        session: Arc<SessionProvider>,
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        formatter: ValueFormatter,
    ) -> Self {
        let (local, _) = watch::channel(LocalState {
            collection: collection.into(),
            ..LocalState::default()
        });

        Self {
            session,
            live: LiveCollection::new(Arc::clone(&store)),
            store,
            formatter,
            local,
        }
    }

    /// Run the first mount pass and start watching the collection
    pub fn mount(&self) {
        let mut collection = None;
        self.local.send_if_modified(|local| {
            if local.mounted {
                return false;
            }
            local.mounted = true;
            collection = Some(local.collection.clone());
            true
        });

        if let Some(collection) = collection {
            debug!("Mounting entries view for {}", collection);
            self.live.watch(&collection);
        }
    }

    /// Stop watching and forget pending selections and dialogs
    pub fn unmount(&self) {
        let was_mounted = self.local.send_if_modified(|local| {
            if !local.mounted {
                return false;
            }
            local.mounted = false;
            local.selections.clear();
            local.delete_candidate = None;
            true
        });

        if was_mounted {
            debug!("Unmounting entries view");
            self.live.unwatch();
        }
    }

    /// Whether the first mount pass has run
    pub fn is_mounted(&self) -> bool {
        self.local.borrow().mounted
    }

    /// Active collection name
    pub fn collection(&self) -> String {
        self.local.borrow().collection.clone()
    }

    /// Switch to another collection
    pub fn set_collection(&self, collection: &str) {
        let mut rebind = false;
        let changed = self.local.send_if_modified(|local| {
            if local.collection == collection {
                return false;
            }
            local.collection = collection.to_string();
            local.selections.clear();
            local.delete_candidate = None;
            rebind = local.mounted;
            true
        });

        if changed {
            info!("Collection switched to {:?}", collection);
        }
        if rebind {
            self.live.watch(collection);
        }
    }

    /// Re-read the active collection
    pub async fn refresh(&self) {
        self.live.refresh().await;
    }

    /// Set an entry's status.
    ///
    /// The selector shows the new status at once. The store is then asked
    /// to update the `status` field and the collection is re-read. A failed
    /// update is only logged; the selector keeps showing the chosen status.
    pub async fn change_status(&self, id: &DocumentId, status: EntryStatus) -> AdminResult<()> {
        let collection = self.collection();
        if self.live.snapshot().find(id).is_none() {
            return Err(AdminError::unknown_entry(collection, id));
        }

        self.local.send_modify(|local| {
            local.selections.insert(id.clone(), status);
        });

        let mut fields = Fields::new();
        fields.insert(EntryStatus::FIELD.to_string(), Value::from(status));

        match self.store.update_fields(&collection, id, fields).await {
            Ok(()) => {
                info!("Status of {}/{} set to {}", collection, id, status);
                self.live.refresh().await;
                self.local.send_if_modified(|local| {
                    if local.selections.get(id) == Some(&status) {
                        local.selections.remove(id);
                        true
                    } else {
                        false
                    }
                });
            }
            Err(e) => error!("Error updating status of {}/{}: {}", collection, id, e),
        }

        Ok(())
    }

    /// Open the delete dialog for one entry, replacing any earlier candidate
    pub fn request_delete(&self, id: &DocumentId) -> AdminResult<()> {
        let snapshot = self.live.snapshot();
        let record = snapshot
            .find(id)
            .ok_or_else(|| AdminError::unknown_entry(self.collection(), id))?;
        let candidate = ProjectedEntry::project(record);

        self.local
            .send_modify(|local| local.delete_candidate = Some(candidate));
        Ok(())
    }

    /// Delete the candidate, close the dialog and re-read the collection.
    ///
    /// A failed delete is logged and the dialog stays open.
    pub async fn confirm_delete(&self) -> AdminResult<()> {
        let candidate = self.delete_candidate().ok_or(AdminError::NoPendingDelete)?;
        let collection = self.collection();

        match self.store.delete(&collection, &candidate.id).await {
            Ok(()) => {
                info!("Deleted {}/{}", collection, candidate.id);
                self.local.send_if_modified(|local| {
                    let same = local
                        .delete_candidate
                        .as_ref()
                        .is_some_and(|pending| pending.id == candidate.id);
                    if same {
                        local.delete_candidate = None;
                    }
                    same
                });
                self.live.refresh().await;
            }
            Err(e) => error!("Error deleting {}/{}: {}", collection, candidate.id, e),
        }

        Ok(())
    }

    /// Close the dialog without deleting anything
    pub fn cancel_delete(&self) {
        self.local
            .send_if_modified(|local| local.delete_candidate.take().is_some());
    }

    /// Entry awaiting delete confirmation
    pub fn delete_candidate(&self) -> Option<ProjectedEntry> {
        self.local.borrow().delete_candidate.clone()
    }

    /// The underlying live collection
    pub const fn live(&self) -> &LiveCollection {
        &self.live
    }

    /// Build the page, or `None` before mounting or without a session
    pub fn render(&self) -> Option<EntriesPage> {
        let local = self.local.borrow().clone();
        if !local.mounted {
            return None;
        }
        self.session.current_session()?;

        let snapshot = self.live.snapshot();

        let body = if snapshot.loading {
            EntriesBody::Loading {
                message: LOADING_MESSAGE.to_string(),
            }
        } else if !snapshot.records.is_empty() {
            let rows = snapshot
                .records
                .iter()
                .map(|record| self.row(&ProjectedEntry::project(record), &local.selections))
                .collect();
            EntriesBody::Table { rows }
        } else if snapshot.error.is_some() {
            EntriesBody::Unavailable
        } else {
            EntriesBody::Empty {
                message: empty_message(&local.collection),
            }
        };

        Some(EntriesPage {
            collection: local.collection.clone(),
            headers: headers(),
            error_banner: snapshot
                .error
                .as_ref()
                .map(|e| format!("Error fetching data: {e}")),
            body,
            status_options: EntryStatus::ALL
                .iter()
                .map(|status| StatusOption {
                    value: status.as_str(),
                    label: status.label(),
                })
                .collect(),
            delete_dialog: local.delete_candidate.as_ref().map(DeleteDialog::for_entry),
        })
    }

    fn row(&self, entry: &ProjectedEntry, selections: &HashMap<DocumentId, EntryStatus>) -> TableRow {
        let status = selections.get(&entry.id).map_or_else(
            || {
                entry
                    .status
                    .as_ref()
                    .and_then(Value::as_str)
                    .map(str::to_string)
            },
            |selected| Some(selected.as_str().to_string()),
        );

        TableRow {
            id: entry.id.to_string(),
            cells: DISPLAY_COLUMNS
                .iter()
                .map(|field| self.formatter.format(entry.cell(field)))
                .collect(),
            status,
        }
    }

    /// Change notifications for everything `render` depends on
    pub fn changes(&self) -> ViewChanges {
        ViewChanges {
            session: self.session.subscribe(),
            mirror: self.live.subscribe(),
            local: self.local.subscribe(),
        }
    }
}

impl std::fmt::Debug for EntriesView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntriesView")
            .field("local", &*self.local.borrow())
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

/// Waits for any change that could alter the rendered page
#[derive(Debug)]
pub struct ViewChanges {
    session: watch::Receiver<SessionState>,
    mirror: watch::Receiver<Mirror>,
    local: watch::Receiver<LocalState>,
}

impl ViewChanges {
    /// Resolve on the next change; `false` once the view is gone
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            result = self.session.changed() => result.is_ok(),
            result = self.mirror.changed() => result.is_ok(),
            result = self.local.changed() => result.is_ok(),
        }
    }
}
