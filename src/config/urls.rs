//! URL configuration for the project
//!
//! The `url_patterns` routes URLs to handlers.

use std::sync::Arc;

use crate::apps::tracker::{self, EntryStore, TrackerState};
use crate::core::router::Router;

pub type SetupError = Box<dyn std::error::Error + Send + Sync>;

pub fn url_patterns(store: Arc<dyn EntryStore>) -> Result<Router, SetupError> {
	let state = TrackerState::new(store)?;
	Ok(Router::new().mount("/", tracker::urls::url_patterns(state)?)?)
}
