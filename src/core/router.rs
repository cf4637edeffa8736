//! URL routing.
//!
//! Routes pair a path pattern with a handler and the methods it accepts.
//! Patterns use `{name}` segments, optionally typed with the `int`
//! converter (`/api/edit/{id:int}/`), similar to Django's `<int:pk>`.

use async_trait::async_trait;
use hyper::Method;
use regex::Regex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::core::exception::{Error, ViewResult};
use crate::core::http::{Request, Response};

/// Anything that can answer a request
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> ViewResult<Response>;
}

/// Errors raised while declaring routes
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
	#[error("Invalid path pattern '{pattern}': {reason}")]
	InvalidPattern { pattern: String, reason: String },

	#[error("Unknown route name: {0}")]
	UnknownName(String),

	#[error("Missing parameter '{param}' for route '{name}'")]
	MissingParam { name: String, param: String },
}

/// Compiled path pattern
#[derive(Debug, Clone)]
pub struct PathPattern {
	pattern: String,
	regex: Regex,
	params: Vec<String>,
}

impl PathPattern {
	/// Compile a pattern
	///
	/// # Examples
	///
	/// ```
	/// use tracker::core::router::PathPattern;
	///
	/// let pattern = PathPattern::new("/api/edit/{id:int}/").unwrap();
	/// let params = pattern.extract_params("/api/edit/12/").unwrap();
	/// assert_eq!(params.get("id"), Some(&"12".to_string()));
	///
	/// assert!(pattern.extract_params("/api/edit/abc/").is_none());
	/// ```
	pub fn new(pattern: &str) -> Result<Self, RouteError> {
		let invalid = |reason: &str| RouteError::InvalidPattern {
			pattern: pattern.to_string(),
			reason: reason.to_string(),
		};

		let mut regex = String::from("^");
		let mut params = Vec::new();
		let mut rest = pattern;

		while let Some(start) = rest.find('{') {
			regex.push_str(&regex::escape(&rest[..start]));
			let end = rest[start..]
				.find('}')
				.map(|offset| start + offset)
				.ok_or_else(|| invalid("unclosed '{'"))?;

			let segment = &rest[start + 1..end];
			let (name, converter) = match segment.split_once(':') {
				Some((name, converter)) => (name, converter),
				None => (segment, "str"),
			};
			if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
				return Err(invalid("parameter names must be alphanumeric"));
			}
			let class = match converter {
				"int" => "[0-9]+",
				"str" => "[^/]+",
				_ => return Err(invalid("unknown converter")),
			};

			regex.push_str(&format!("(?P<{}>{})", name, class));
			params.push(name.to_string());
			rest = &rest[end + 1..];
		}
		regex.push_str(&regex::escape(rest));
		regex.push('$');

		let regex = Regex::new(&regex).map_err(|e| invalid(&e.to_string()))?;

		Ok(Self {
			pattern: pattern.to_string(),
			regex,
			params,
		})
	}

	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	pub fn is_match(&self, path: &str) -> bool {
		self.regex.is_match(path)
	}

	/// Extract parameters from `path`, or `None` if it does not match
	pub fn extract_params(&self, path: &str) -> Option<HashMap<String, String>> {
		let captures = self.regex.captures(path)?;
		Some(
			self.params
				.iter()
				.filter_map(|name| {
					captures
						.name(name)
						.map(|value| (name.clone(), value.as_str().to_string()))
				})
				.collect(),
		)
	}

	/// Substitute parameters back into the pattern
	fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
		let mut url = String::new();
		let mut rest = self.pattern.as_str();

		while let Some(start) = rest.find('{') {
			url.push_str(&rest[..start]);
			let Some(end) = rest[start..].find('}').map(|offset| start + offset) else {
				break;
			};
			let segment = &rest[start + 1..end];
			let param = segment.split_once(':').map(|(p, _)| p).unwrap_or(segment);

			let value = params
				.iter()
				.find(|(key, _)| *key == param)
				.map(|(_, value)| *value)
				.ok_or_else(|| RouteError::MissingParam {
					name: name.to_string(),
					param: param.to_string(),
				})?;
			url.push_str(value);
			rest = &rest[end + 1..];
		}
		url.push_str(rest);

		Ok(url)
	}
}

/// Route definition
#[derive(Clone)]
pub struct Route {
	pub pattern: PathPattern,
	pub methods: Vec<Method>,
	pub handler: Arc<dyn Handler>,
	pub name: Option<String>,
}

impl Route {
	/// Create a route accepting `methods`. A route that accepts `GET`
	/// also answers `HEAD`.
	pub fn new(
		path: &str,
		methods: impl IntoIterator<Item = Method>,
		handler: Arc<dyn Handler>,
	) -> Result<Self, RouteError> {
		let mut methods: Vec<Method> = methods.into_iter().collect();
		if methods.contains(&Method::GET) && !methods.contains(&Method::HEAD) {
			methods.push(Method::HEAD);
		}

		Ok(Self {
			pattern: PathPattern::new(path)?,
			methods,
			handler,
			name: None,
		})
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn allows(&self, method: &Method) -> bool {
		self.methods.contains(method)
	}
}

/// Ordered route table; the first matching pattern wins
#[derive(Clone, Default)]
pub struct Router {
	routes: Vec<Route>,
}

impl Router {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn route(mut self, route: Route) -> Self {
		self.routes.push(route);
		self
	}

	/// Append every route of `other` under `prefix`
	pub fn mount(mut self, prefix: &str, other: Router) -> Result<Self, RouteError> {
		let prefix = prefix.trim_end_matches('/');
		for route in other.routes {
			let path = format!("{}{}", prefix, route.pattern.pattern());
			self.routes.push(Route {
				pattern: PathPattern::new(&path)?,
				..route
			});
		}
		Ok(self)
	}

	pub fn routes(&self) -> &[Route] {
		&self.routes
	}

	/// Build the URL of a named route
	///
	/// # Examples
	///
	/// ```
	/// use hyper::Method;
	/// use tracker::core::router::{Route, Router, view};
	/// use tracker::core::http::Response;
	///
	/// let handler = view((), |_req, _state: ()| async { Ok(Response::ok()) });
	/// let router = Router::new()
	///     .route(Route::new("/api/edit/{id:int}/", [Method::GET], handler).unwrap().with_name("edit_entry"));
	///
	/// assert_eq!(router.reverse("edit_entry", &[("id", "3")]).unwrap(), "/api/edit/3/");
	/// ```
	pub fn reverse(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
		let route = self
			.routes
			.iter()
			.find(|route| route.name.as_deref() == Some(name))
			.ok_or_else(|| RouteError::UnknownName(name.to_string()))?;

		route.pattern.reverse(name, params)
	}

	/// Dispatch a request and turn any error into an error page
	pub async fn dispatch(&self, request: Request) -> Response {
		let method = request.method.clone();
		let path = request.path().to_string();

		let response = match self.handle(request).await {
			Ok(response) => response,
			Err(error) => error.into_response(),
		};

		tracing::debug!(%method, %path, status = response.status.as_u16(), "request served");
		response
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, mut request: Request) -> ViewResult<Response> {
		let path = request.path().to_string();
		let mut allowed: Vec<Method> = Vec::new();

		for route in &self.routes {
			let Some(params) = route.pattern.extract_params(&path) else {
				continue;
			};

			if !route.allows(&request.method) {
				for method in &route.methods {
					if !allowed.contains(method) {
						allowed.push(method.clone());
					}
				}
				continue;
			}

			for (key, value) in params {
				request.set_path_param(key, value);
			}

			let is_head = request.method == Method::HEAD;
			let mut response = route.handler.handle(request).await?;
			if is_head {
				response.body = bytes::Bytes::new();
			}
			return Ok(response);
		}

		if allowed.is_empty() {
			Err(Error::NotFound(format!("No route matches {}", path)))
		} else {
			Err(Error::MethodNotAllowed {
				method: request.method,
				allowed,
			})
		}
	}
}

/// Handler built from an async function and the state it needs
pub struct ViewFn<S, F> {
	state: S,
	view: F,
}

/// Wrap an async view function `view(request, state)` as a [`Handler`]
pub fn view<S, F, Fut>(state: S, view: F) -> Arc<dyn Handler>
where
	S: Clone + Send + Sync + 'static,
	F: Fn(Request, S) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = ViewResult<Response>> + Send + 'static,
{
	Arc::new(ViewFn { state, view })
}

#[async_trait]
impl<S, F, Fut> Handler for ViewFn<S, F>
where
	S: Clone + Send + Sync + 'static,
	F: Fn(Request, S) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = ViewResult<Response>> + Send + 'static,
{
	async fn handle(&self, request: Request) -> ViewResult<Response> {
		(self.view)(request, self.state.clone()).await
	}
}
