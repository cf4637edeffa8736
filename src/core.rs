//! Framework plumbing shared by every app in the project.

pub mod exception;
pub mod htmx;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;
pub mod shortcuts;
pub mod templates;

pub use exception::{Error, ViewResult};
pub use http::{Request, Response};
pub use router::{Handler, Route, Router, view};
