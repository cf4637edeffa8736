//! Shortcut functions for building common responses.

use tera::Context;

use crate::core::exception::ViewResult;
use crate::core::http::Response;
use crate::core::templates::Templates;

/// Render a template and return an HTTP 200 HTML response
pub fn render(templates: &Templates, template_name: &str, context: &Context) -> ViewResult<Response> {
	let html = templates.render(template_name, context)?;
	Ok(render_html(html))
}

/// Wrap a pre-rendered HTML string in an HTTP 200 response
pub fn render_html(html: impl Into<String>) -> Response {
	Response::ok()
		.with_header("Content-Type", "text/html; charset=utf-8")
		.with_body(html.into())
}

/// Redirect to `location` with `302 Found`
pub fn redirect(location: &str) -> Response {
	Response::temporary_redirect(location)
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;

	#[rstest]
	fn test_render_html_sets_content_type() {
		let response = render_html("<p>hi</p>");

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(
			response.headers.get("content-type").unwrap(),
			"text/html; charset=utf-8"
		);
		assert_eq!(response.text(), "<p>hi</p>");
	}

	#[rstest]
	fn test_redirect() {
		let response = redirect("/admin/");

		assert_eq!(response.status, StatusCode::FOUND);
		assert_eq!(response.headers.get("location").unwrap(), "/admin/");
	}

	#[rstest]
	fn test_render_unknown_template_is_error() {
		let templates = Templates::embedded().unwrap();
		assert!(render(&templates, "missing.html", &Context::new()).is_err());
	}
}
