//! Clients for the hosted auth service and document store
//!
//! The dashboard talks to two services: an email/password auth service that
//! publishes session changes, and a schemaless document store that supports
//! one-shot reads, live collection subscriptions, partial updates and
//! deletes. Both are modelled as traits so the rest of the workspace can run
//! against the Firebase REST clients or the in-memory mocks.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::significant_drop_tightening,
    clippy::unnecessary_literal_bound,
    clippy::type_complexity,
    clippy::items_after_statements,
    clippy::too_many_lines,
    clippy::redundant_closure,
    clippy::unused_async,
    clippy::return_self_not_must_use,
    clippy::uninlined_format_args,
    clippy::single_match_else
)]

pub mod backend;
pub mod error;
pub mod firebase;
pub mod mock;
pub mod service;
pub mod subscription;

pub use backend::Backend;
pub use error::{BackendError, BackendResult};
pub use service::{AuthService, DocumentStore, ErrorListener, SessionListener, SnapshotListener};
pub use subscription::{Listeners, Subscription};

// Re-export commonly used items
pub use firebase::{FirebaseAuth, FirestoreStore};
pub use mock::{MockAuthService, MockDocumentStore, StoreCall};
