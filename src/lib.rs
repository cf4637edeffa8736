//! # Shape Tracker
//!
//! A small record-tracking web application. Users browse a read-only grid of
//! shape/color entries at `/`, administrators create, edit and delete entries
//! through the portal at `/admin/`. Pages are rendered on the server and
//! refreshed with htmx partial updates.
//!
//! ## Layout
//!
//! - [`core`] - HTTP request/response types, routing, the hyper server,
//!   template rendering, htmx helpers, logging and the shared error type
//! - [`config`] - settings loading and the project URL configuration
//! - [`apps::tracker`] - the tracker app: models, forms, views and urls
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tracker::apps::tracker::SqliteEntryStore;
//! use tracker::config::{Settings, urls};
//! use tracker::core::server::HttpServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let settings = Settings::load(None)?;
//! let store = SqliteEntryStore::connect(&settings.database_url, settings.max_connections).await?;
//! store.migrate().await?;
//!
//! let router = urls::url_patterns(Arc::new(store))?;
//! HttpServer::new(Arc::new(router)).listen(settings.bind_addr).await?;
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod config;
pub mod core;

pub use crate::core::exception::{Error, ViewResult};
pub use crate::core::http::{Request, Response};
