//! Dashboard components for the DKH admin
//!
//! - [`session::SessionProvider`] tracks who is signed in.
//! - [`collection::LiveCollection`] mirrors one collection of the document
//!   store and keeps it current.
//! - [`entries::EntriesView`] turns the mirror into a table with status and
//!   delete actions.
//! - [`nav::NavBar`] is the page header.

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
    clippy::significant_drop_in_scrutinee,
    clippy::unnecessary_literal_bound,
    clippy::type_complexity,
    clippy::items_after_statements,
    clippy::too_many_lines,
    clippy::return_self_not_must_use,
    clippy::uninlined_format_args
)]

pub mod collection;
pub mod dashboard;
pub mod entries;
pub mod error;
pub mod nav;
pub mod session;

pub use collection::{CollectionSnapshot, LiveCollection};
pub use dashboard::Dashboard;
pub use entries::{EntriesBody, EntriesPage, EntriesView, ProjectedEntry, ValueFormatter};
pub use error::{AdminError, AdminResult};
pub use nav::NavBar;
pub use session::{Access, AuthPhase, SessionProvider, SessionState};
