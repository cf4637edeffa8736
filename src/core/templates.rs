//! Tera template engine with the project's templates compiled in.

use tera::{Context, Tera};

/// (name, source) pairs for every template shipped with the binary
const TEMPLATES: &[(&str, &str)] = &[
	("base.html", include_str!("../../templates/base.html")),
	("user.html", include_str!("../../templates/user.html")),
	("admin.html", include_str!("../../templates/admin.html")),
	("_rows.html", include_str!("../../templates/_rows.html")),
	(
		"_admin_entries_table.html",
		include_str!("../../templates/_admin_entries_table.html"),
	),
	("_entry_row.html", include_str!("../../templates/_entry_row.html")),
	("_entry_form.html", include_str!("../../templates/_entry_form.html")),
	("_edit_form.html", include_str!("../../templates/_edit_form.html")),
	("_form_fields.html", include_str!("../../templates/_form_fields.html")),
];

/// Template renderer shared by all views
pub struct Templates {
	tera: Tera,
}

impl Templates {
	/// Load the embedded templates. HTML autoescaping stays on.
	pub fn embedded() -> Result<Self, tera::Error> {
		let mut tera = Tera::default();
		tera.add_raw_templates(TEMPLATES.iter().copied())?;
		Ok(Self { tera })
	}

	pub fn render(&self, name: &str, context: &Context) -> Result<String, tera::Error> {
		self.tera.render(name, context)
	}

	pub fn names(&self) -> Vec<&str> {
		self.tera.get_template_names().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_all_templates_compile() {
		let templates = Templates::embedded().unwrap();
		let mut names = templates.names();
		names.sort();

		assert_eq!(names.len(), TEMPLATES.len());
		assert!(names.contains(&"admin.html"));
	}
}
