//! Project configuration: settings and the root URL table

pub mod settings;
pub mod urls;

pub use settings::{Settings, SettingsError};
