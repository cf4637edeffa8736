//! htmx partial-update protocol.
//!
//! htmx marks its requests with `HX-Request: true`. Views decide once per
//! request whether to answer with a fragment or signal ([`ResponseMode::Partial`])
//! or with a full page or redirect ([`ResponseMode::Full`]).

use crate::core::http::{Request, Response};

pub const HX_REQUEST: &str = "HX-Request";
pub const HX_TRIGGER: &str = "HX-Trigger";

/// How a view should answer the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
	/// Request came from htmx: answer with fragments or event signals
	Partial,
	/// Plain browser request: answer with full pages and redirects
	Full,
}

impl ResponseMode {
	/// Inspect the request marker
	///
	/// # Examples
	///
	/// ```
	/// use tracker::core::htmx::ResponseMode;
	/// use tracker::core::http::Request;
	///
	/// let htmx = Request::builder().header("HX-Request", "true").build();
	/// assert_eq!(ResponseMode::from_request(&htmx), ResponseMode::Partial);
	///
	/// let browser = Request::builder().build();
	/// assert_eq!(ResponseMode::from_request(&browser), ResponseMode::Full);
	/// ```
	pub fn from_request(request: &Request) -> Self {
		match request.header(HX_REQUEST) {
			Some(value) if value.trim().eq_ignore_ascii_case("true") => ResponseMode::Partial,
			_ => ResponseMode::Full,
		}
	}
}

/// Empty `204 No Content` response that fires `event` on the client
pub fn trigger(event: &str) -> Response {
	Response::no_content().with_header(HX_TRIGGER, event)
}
