//! Error type shared by handlers, the router and the server.
//!
//! Every error is converted into a [`Response`] at the handler boundary via
//! [`Error::into_response`], so nothing past the router ever sees an `Err`.

use crate::core::http::Response;
use hyper::{Method, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Method {method} not allowed")]
	MethodNotAllowed { method: Method, allowed: Vec<Method> },

	#[error("Bad request: {0}")]
	BadRequest(String),

	#[error("Database error: {0}")]
	Database(String),

	#[error("Template error: {0}")]
	Template(#[from] tera::Error),
}

pub type ViewResult<T> = Result<T, Error>;

impl Error {
	/// HTTP status this error is reported with
	pub fn status(&self) -> StatusCode {
		match self {
			Error::NotFound(_) => StatusCode::NOT_FOUND,
			Error::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
			Error::BadRequest(_) => StatusCode::BAD_REQUEST,
			Error::Database(_) | Error::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Convert the error into a small HTML error page.
	///
	/// Server-side failures never leak their details to the client; the
	/// full error is logged instead.
	pub fn into_response(self) -> Response {
		let status = self.status();

		let detail = match &self {
			Error::NotFound(what) => Some(what.clone()),
			Error::BadRequest(reason) => Some(reason.clone()),
			Error::MethodNotAllowed { method, .. } => Some(format!("{} is not supported here", method)),
			_ => None,
		};

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}

		let reason = status.canonical_reason().unwrap_or("Error");
		let body = match detail {
			Some(detail) => format!(
				"<!DOCTYPE html>\n<html><head><title>{code} {reason}</title></head>\
				 <body><h1>{code} {reason}</h1><p>{detail}</p></body></html>\n",
				code = status.as_u16(),
				reason = reason,
				detail = tera::escape_html(&detail),
			),
			None => format!(
				"<!DOCTYPE html>\n<html><head><title>{code} {reason}</title></head>\
				 <body><h1>{code} {reason}</h1></body></html>\n",
				code = status.as_u16(),
				reason = reason,
			),
		};

		let mut response = Response::new(status)
			.with_header("Content-Type", "text/html; charset=utf-8")
			.with_body(body);

		if let Error::MethodNotAllowed { allowed, .. } = &self {
			let allow = allowed
				.iter()
				.map(Method::as_str)
				.collect::<Vec<_>>()
				.join(", ");
			response = response.with_header("Allow", &allow);
		}

		response
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(Error::NotFound("Entry 7".into()), StatusCode::NOT_FOUND)]
	#[case(Error::BadRequest("bad form".into()), StatusCode::BAD_REQUEST)]
	#[case(Error::Database("pool closed".into()), StatusCode::INTERNAL_SERVER_ERROR)]
	#[case(Error::Template(tera::Error::msg("broken")), StatusCode::INTERNAL_SERVER_ERROR)]
	fn test_status_mapping(#[case] error: Error, #[case] expected: StatusCode) {
		assert_eq!(error.status(), expected);
		assert_eq!(error.into_response().status, expected);
	}

	#[rstest]
	fn test_not_found_page_escapes_detail() {
		let response = Error::NotFound("<script>".into()).into_response();
		let body = String::from_utf8(response.body.to_vec()).unwrap();

		assert!(body.contains("404 Not Found"));
		assert!(body.contains("&lt;script&gt;"));
		assert!(!body.contains("<script>"));
	}

	#[rstest]
	fn test_bad_request_page_escapes_quotes() {
		let response = Error::BadRequest(r#"field "name" & more"#.into()).into_response();
		let body = response.text();

		assert!(body.contains("field &quot;name&quot; &amp; more"));
	}

	#[rstest]
	fn test_server_error_hides_detail() {
		let response = Error::Database("secret dsn".into()).into_response();
		let body = String::from_utf8(response.body.to_vec()).unwrap();

		assert!(body.contains("500 Internal Server Error"));
		assert!(!body.contains("secret dsn"));
	}

	#[rstest]
	fn test_method_not_allowed_sets_allow_header() {
		let response = Error::MethodNotAllowed {
			method: Method::PUT,
			allowed: vec![Method::GET, Method::POST],
		}
		.into_response();

		assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
		assert_eq!(response.headers.get("allow").unwrap(), "GET, POST");
	}
}
