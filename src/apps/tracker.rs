//! tracker application module
//!
//! Shape/color entries with a read-only user grid and an htmx admin portal.

pub mod forms;
pub mod models;
pub mod urls;
pub mod views;

pub use forms::{EntryForm, FormErrors};
pub use models::{Color, Entry, EntryStore, NewEntry, Shape, SqliteEntryStore, StoreError};
pub use views::{ENTRY_CHANGED, TrackerState};
