//! URL configuration for the tracker app

use hyper::Method;

use super::views::{self, TrackerState};
use crate::core::router::{Route, RouteError, Router, view};

pub const USER_PORTAL: &str = "/";
pub const ADMIN_PORTAL: &str = "/admin/";
pub const TABLE_ROWS: &str = "/api/rows/";
pub const ADMIN_ENTRIES: &str = "/api/admin-entries/";
pub const EDIT_ENTRY: &str = "/api/edit/{id:int}/";
pub const DELETE_ENTRY: &str = "/api/delete/{id:int}/";

pub fn edit_url(id: i64) -> String {
	format!("/api/edit/{}/", id)
}

pub fn delete_url(id: i64) -> String {
	format!("/api/delete/{}/", id)
}

pub fn url_patterns(state: TrackerState) -> Result<Router, RouteError> {
	Ok(Router::new()
		.route(
			Route::new(USER_PORTAL, [Method::GET], view(state.clone(), views::user_portal))?
				.with_name("user_portal"),
		)
		.route(
			Route::new(
				ADMIN_PORTAL,
				[Method::GET, Method::POST],
				view(state.clone(), views::admin_portal),
			)?
			.with_name("admin_portal"),
		)
		.route(
			Route::new(TABLE_ROWS, [Method::GET], view(state.clone(), views::table_rows))?
				.with_name("table_rows"),
		)
		.route(
			Route::new(
				ADMIN_ENTRIES,
				[Method::GET],
				view(state.clone(), views::admin_entries_list),
			)?
			.with_name("admin_entries_list"),
		)
		.route(
			Route::new(
				EDIT_ENTRY,
				[Method::GET, Method::POST],
				view(state.clone(), views::edit_entry),
			)?
			.with_name("edit_entry"),
		)
		.route(
			Route::new(
				DELETE_ENTRY,
				[Method::POST, Method::DELETE],
				view(state, views::delete_entry),
			)?
			.with_name("delete_entry"),
		))
}
