//! HTTP request and response types passed between the server, the router
//! and the views.

use bytes::Bytes;
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, StatusCode, Uri, Version};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::str::FromStr;

use crate::core::exception::{Error, ViewResult};

/// HTTP Request representation
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	/// Parameters captured from the matched route pattern
	pub path_params: HashMap<String, String>,
}

impl Request {
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			path_params: HashMap::new(),
		}
	}

	/// Start building a request, mostly useful in tests
	///
	/// # Examples
	///
	/// ```
	/// use tracker::core::http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/admin/")
	///     .header("HX-Request", "true")
	///     .form(&[("name", "Al")])
	///     .build();
	///
	/// assert_eq!(request.path(), "/admin/");
	/// assert_eq!(request.header("hx-request"), Some("true"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Get a header value as a string, if present and valid UTF-8
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Set a path parameter (used by the router for `{name}` segments)
	pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(key.into(), value.into());
	}

	/// Parse a captured path parameter
	///
	/// A missing or unparsable parameter is reported as not found, the same
	/// way an unmatched URL would be.
	pub fn path_param<T: FromStr>(&self, key: &str) -> ViewResult<T> {
		self.path_params
			.get(key)
			.and_then(|raw| raw.parse().ok())
			.ok_or_else(|| Error::NotFound(format!("No match for path parameter '{}'", key)))
	}

	/// Decode an `application/x-www-form-urlencoded` body
	///
	/// A field sent more than once keeps its last value.
	pub fn form<T: DeserializeOwned>(&self) -> ViewResult<T> {
		let malformed = |e: &dyn std::fmt::Display| Error::BadRequest(format!("Malformed form data: {}", e));

		let pairs: Vec<(String, String)> =
			serde_urlencoded::from_bytes(&self.body).map_err(|e| malformed(&e))?;

		let mut fields: Vec<(String, String)> = Vec::with_capacity(pairs.len());
		for (key, value) in pairs {
			match fields.iter_mut().find(|(existing, _)| *existing == key) {
				Some(field) => field.1 = value,
				None => fields.push((key, value)),
			}
		}

		let encoded = serde_urlencoded::to_string(&fields).map_err(|e| malformed(&e))?;
		serde_urlencoded::from_str(&encoded).map_err(|e| malformed(&e))
	}
}

/// Builder for [`Request`]
#[derive(Default)]
pub struct RequestBuilder {
	method: Option<Method>,
	uri: Option<String>,
	headers: HeaderMap,
	body: Bytes,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = Some(method);
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	/// Add a header; invalid names or values are skipped
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Encode `fields` as a urlencoded form body and set the content type
	pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
		let encoded = serde_urlencoded::to_string(fields).unwrap_or_default();
		self.headers.insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static("application/x-www-form-urlencoded"),
		);
		self.body = Bytes::from(encoded);
		self
	}

	/// Build the request. An unparsable URI falls back to `/`.
	pub fn build(self) -> Request {
		let uri = self
			.uri
			.and_then(|raw| raw.parse::<Uri>().ok())
			.unwrap_or_else(|| Uri::from_static("/"));

		Request::new(
			self.method.unwrap_or(Method::GET),
			uri,
			Version::HTTP_11,
			self.headers,
			self.body,
		)
	}
}

/// HTTP Response representation
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use tracker::core::http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	/// Create a Response with HTTP 302 Found (temporary redirect)
	///
	/// # Examples
	///
	/// ```
	/// use tracker::core::http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::temporary_redirect("/admin/");
	/// assert_eq!(response.status, StatusCode::FOUND);
	/// assert_eq!(response.headers.get("location").unwrap(), "/admin/");
	/// ```
	pub fn temporary_redirect(location: impl AsRef<str>) -> Self {
		Self::new(StatusCode::FOUND).with_header(header::LOCATION.as_str(), location.as_ref())
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a custom header to the response; invalid names or values are skipped
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Body as UTF-8 text (lossy)
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}
