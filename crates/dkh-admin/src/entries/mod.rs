//! Entries view: projection, formatting and the interactive table

pub mod columns;
pub mod format;
pub mod view;

pub use columns::{DISPLAY_COLUMNS, ProjectedEntry};
pub use format::{DisplayZone, ValueFormatter};
pub use view::{
    DeleteDialog, EntriesBody, EntriesPage, EntriesView, StatusOption, TableRow, ViewChanges,
};
