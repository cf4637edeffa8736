//! Tracker views
//!
//! Read-only pages for users, the admin portal, and the htmx endpoints that
//! swap fragments into those pages.

use chrono::SecondsFormat;
use hyper::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tera::Context;

use super::forms::{EntryForm, FormErrors};
use super::models::{Choice, Color, Entry, EntryStore, Shape, StoreError};
use super::urls;
use crate::core::exception::ViewResult;
use crate::core::htmx::{self, ResponseMode};
use crate::core::http::{Request, Response};
use crate::core::shortcuts::{redirect, render};
use crate::core::templates::Templates;

/// htmx event fired after an entry is created or deleted
pub const ENTRY_CHANGED: &str = "entryChanged";

/// Everything a tracker view needs, cloned into each request
#[derive(Clone)]
pub struct TrackerState {
	pub store: Arc<dyn EntryStore>,
	pub templates: Arc<Templates>,
}

impl TrackerState {
	pub fn new(store: Arc<dyn EntryStore>) -> Result<Self, tera::Error> {
		Ok(Self {
			store,
			templates: Arc::new(Templates::embedded()?),
		})
	}
}

/// An entry as the templates see it
#[derive(Debug, Serialize)]
struct EntryRow {
	id: i64,
	name: String,
	shape: &'static str,
	shape_label: &'static str,
	color: &'static str,
	color_label: &'static str,
	created_at: String,
	created_at_iso: String,
	edit_url: String,
	delete_url: String,
}

impl From<&Entry> for EntryRow {
	fn from(entry: &Entry) -> Self {
		Self {
			id: entry.id,
			name: entry.name.clone(),
			shape: entry.shape.value(),
			shape_label: entry.shape.label(),
			color: entry.color.value(),
			color_label: entry.color.label(),
			created_at: entry.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
			created_at_iso: entry.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
			edit_url: urls::edit_url(entry.id),
			delete_url: urls::delete_url(entry.id),
		}
	}
}

fn rows(entries: &[Entry]) -> Vec<EntryRow> {
	entries.iter().map(EntryRow::from).collect()
}

#[derive(Debug, Serialize)]
struct ChoiceOption {
	value: &'static str,
	label: &'static str,
}

fn options<C: Choice>() -> Vec<ChoiceOption> {
	C::ALL
		.iter()
		.map(|choice| ChoiceOption {
			value: choice.value(),
			label: choice.label(),
		})
		.collect()
}

#[derive(Debug, Default, Serialize)]
struct FormValues {
	name: String,
	shape: String,
	color: String,
}

/// A form as the templates see it: submitted values, errors and choices
#[derive(Debug, Serialize)]
struct FormContext {
	action: String,
	values: FormValues,
	errors: BTreeMap<&'static str, Vec<String>>,
	shapes: Vec<ChoiceOption>,
	colors: Vec<ChoiceOption>,
}

impl FormContext {
	fn new(action: String, form: &EntryForm, errors: &FormErrors) -> Self {
		Self {
			action,
			values: FormValues {
				name: form.name.clone().unwrap_or_default(),
				shape: form.shape.clone().unwrap_or_default(),
				color: form.color.clone().unwrap_or_default(),
			},
			errors: errors.by_field(),
			shapes: options::<Shape>(),
			colors: options::<Color>(),
		}
	}

	fn unbound(action: String) -> Self {
		Self::new(action, &EntryForm::default(), &FormErrors::default())
	}
}

/// Fetch the entry a request targets; unknown ids become 404s
async fn fetch_entry(state: &TrackerState, request: &Request) -> ViewResult<Entry> {
	let id: i64 = request.path_param("id")?;
	state.store.get(id).await.map_err(|error| {
		if let StoreError::NotFound(_) = error {
			tracing::warn!(id, path = request.path(), "entry not found");
		}
		error.into()
	})
}

fn render_admin(state: &TrackerState, entries: &[Entry], form: FormContext) -> ViewResult<Response> {
	let mut context = Context::new();
	context.insert("entries", &rows(entries));
	context.insert("form", &form);
	render(&state.templates, "admin.html", &context)
}

fn render_edit_form(state: &TrackerState, entry: &Entry, form: FormContext) -> ViewResult<Response> {
	let mut context = Context::new();
	context.insert("entry", &EntryRow::from(entry));
	context.insert("form", &form);
	render(&state.templates, "_edit_form.html", &context)
}

/// The user portal grid. Rows refresh by polling [`table_rows`].
pub async fn user_portal(_request: Request, state: TrackerState) -> ViewResult<Response> {
	let entries = state.store.list_all().await?;

	let mut context = Context::new();
	context.insert("entries", &rows(&entries));
	context.insert("rows_url", urls::TABLE_ROWS);
	render(&state.templates, "user.html", &context)
}

/// Only the table rows, for polling
pub async fn table_rows(_request: Request, state: TrackerState) -> ViewResult<Response> {
	let entries = state.store.list_all().await?;

	let mut context = Context::new();
	context.insert("entries", &rows(&entries));
	render(&state.templates, "_rows.html", &context)
}

/// Only the admin entries table, re-fetched after `entryChanged`
pub async fn admin_entries_list(_request: Request, state: TrackerState) -> ViewResult<Response> {
	let entries = state.store.list_all().await?;

	let mut context = Context::new();
	context.insert("entries", &rows(&entries));
	render(&state.templates, "_admin_entries_table.html", &context)
}

/// Admin portal: entry list plus the create form
pub async fn admin_portal(request: Request, state: TrackerState) -> ViewResult<Response> {
	let mode = ResponseMode::from_request(&request);
	let action = urls::ADMIN_PORTAL.to_string();

	let form = if request.method == Method::POST {
		let form: EntryForm = request.form()?;
		match form.validate() {
			Ok(new_entry) => {
				state.store.create(new_entry).await?;
				return Ok(match mode {
					ResponseMode::Partial => htmx::trigger(ENTRY_CHANGED),
					ResponseMode::Full => redirect(urls::ADMIN_PORTAL),
				});
			}
			Err(errors) => {
				tracing::debug!(fields = ?errors.fields().collect::<Vec<_>>(), "create form invalid");
				FormContext::new(action, &form, &errors)
			}
		}
	} else {
		FormContext::unbound(action)
	};

	let entries = state.store.list_all().await?;
	render_admin(&state, &entries, form)
}

/// Edit form for one entry (GET) and its submission (POST)
pub async fn edit_entry(request: Request, state: TrackerState) -> ViewResult<Response> {
	let mode = ResponseMode::from_request(&request);
	let entry = fetch_entry(&state, &request).await?;
	let action = urls::edit_url(entry.id);

	if request.method != Method::POST {
		let form = FormContext::new(action, &EntryForm::from_entry(&entry), &FormErrors::default());
		return render_edit_form(&state, &entry, form);
	}

	let form: EntryForm = request.form()?;
	match form.validate() {
		Ok(changes) => {
			let updated = state.store.update(entry.id, changes).await?;
			match mode {
				ResponseMode::Partial => {
					let mut context = Context::new();
					context.insert("entry", &EntryRow::from(&updated));
					render(&state.templates, "_entry_row.html", &context)
				}
				ResponseMode::Full => Ok(redirect(urls::ADMIN_PORTAL)),
			}
		}
		Err(errors) => {
			tracing::debug!(id = entry.id, fields = ?errors.fields().collect::<Vec<_>>(), "edit form invalid");
			render_edit_form(&state, &entry, FormContext::new(action, &form, &errors))
		}
	}
}

/// Delete one entry and tell the client to refresh
pub async fn delete_entry(request: Request, state: TrackerState) -> ViewResult<Response> {
	let entry = fetch_entry(&state, &request).await?;
	state.store.delete(entry.id).await?;

	Ok(htmx::trigger(ENTRY_CHANGED))
}
