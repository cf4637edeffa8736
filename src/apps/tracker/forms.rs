//! Entry form validation.
//!
//! Both the create and the edit views run the same [`EntryForm::validate`].
//! Validation is pure: it either yields a [`NewEntry`] ready for the store or
//! a [`FormErrors`] map from field name to messages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::models::{Choice, Color, Entry, NAME_MAX_LENGTH, NewEntry, Shape};

pub const NAME_MIN_LENGTH: usize = 2;
pub const FIELDS: [&str; 3] = ["name", "shape", "color"];

const REQUIRED: &str = "This field is required.";

/// Field name → error messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
	pub fn add(&mut self, field: &str, message: impl Into<String>) {
		self.0.entry(field.to_string()).or_default().push(message.into());
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, field: &str) -> &[String] {
		self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Fields with errors, in form order
	pub fn fields(&self) -> impl Iterator<Item = &str> {
		FIELDS
			.iter()
			.copied()
			.filter(|field| self.0.contains_key(*field))
	}

	/// Errors for every known field, with empty lists where a field is clean
	pub fn by_field(&self) -> BTreeMap<&'static str, Vec<String>> {
		FIELDS
			.iter()
			.map(|field| (*field, self.get(field).to_vec()))
			.collect()
	}
}

/// Raw submitted values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryForm {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub shape: Option<String>,
	#[serde(default)]
	pub color: Option<String>,
}

impl EntryForm {
	/// Form pre-filled from an existing entry
	pub fn from_entry(entry: &Entry) -> Self {
		Self {
			name: Some(entry.name.clone()),
			shape: Some(entry.shape.value().to_string()),
			color: Some(entry.color.value().to_string()),
		}
	}

	/// Validate every field and collect all failures
	///
	/// # Examples
	///
	/// ```
	/// use tracker::apps::tracker::forms::EntryForm;
	///
	/// let form = EntryForm {
	///     name: Some("A".into()),
	///     shape: Some("circle".into()),
	///     color: Some("red".into()),
	/// };
	///
	/// let errors = form.validate().unwrap_err();
	/// assert_eq!(errors.get("name"), ["Name must be at least 2 characters."]);
	/// ```
	pub fn validate(&self) -> Result<NewEntry, FormErrors> {
		let mut errors = FormErrors::default();

		let name = clean_name(self.name.as_deref()).map_err(|message| errors.add("name", message));
		let shape = clean_choice::<Shape>(self.shape.as_deref())
			.map_err(|message| errors.add("shape", message));
		let color = clean_choice::<Color>(self.color.as_deref())
			.map_err(|message| errors.add("color", message));

		match (name, shape, color) {
			(Ok(name), Ok(shape), Ok(color)) => Ok(NewEntry { name, shape, color }),
			_ => Err(errors),
		}
	}
}

fn clean_name(raw: Option<&str>) -> Result<String, String> {
	let name = raw.map(str::trim).unwrap_or_default();
	let length = name.chars().count();

	if length == 0 {
		return Err(REQUIRED.to_string());
	}
	if length < NAME_MIN_LENGTH {
		return Err("Name must be at least 2 characters.".to_string());
	}
	if length > NAME_MAX_LENGTH {
		return Err(format!(
			"Ensure this value has at most {} characters (it has {}).",
			NAME_MAX_LENGTH, length
		));
	}

	Ok(name.to_string())
}

fn clean_choice<C: Choice>(raw: Option<&str>) -> Result<C, String> {
	let value = raw.map(str::trim).unwrap_or_default();
	if value.is_empty() {
		return Err(REQUIRED.to_string());
	}

	C::from_value(value).ok_or_else(|| {
		format!(
			"Select a valid choice. {} is not one of the available choices.",
			value
		)
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn form(name: &str, shape: &str, color: &str) -> EntryForm {
		EntryForm {
			name: Some(name.to_string()),
			shape: Some(shape.to_string()),
			color: Some(color.to_string()),
		}
	}

	#[rstest]
	#[case("Al", "circle", "red")]
	#[case("Box", "square", "blue")]
	#[case("Tri", "triangle", "yellow")]
	#[case("Go", "circle", "green")]
	fn test_valid_forms(#[case] name: &str, #[case] shape: &str, #[case] color: &str) {
		let cleaned = form(name, shape, color).validate().unwrap();

		assert_eq!(cleaned.name, name);
		assert_eq!(cleaned.shape.value(), shape);
		assert_eq!(cleaned.color.value(), color);
	}

	#[rstest]
	fn test_error_fields_follow_form_order() {
		let errors = form("", "hexagon", "pink").validate().unwrap_err();

		assert_eq!(errors.fields().collect::<Vec<_>>(), ["name", "shape", "color"]);
	}

	#[rstest]
	fn test_name_is_trimmed() {
		let cleaned = form("  Al  ", "circle", "red").validate().unwrap();
		assert_eq!(cleaned.name, "Al");
	}

	#[rstest]
	#[case("A")]
	#[case(" A ")]
	fn test_short_name_rejected(#[case] name: &str) {
		let errors = form(name, "circle", "red").validate().unwrap_err();

		assert_eq!(errors.get("name"), ["Name must be at least 2 characters."]);
		assert!(errors.get("shape").is_empty());
		assert!(errors.get("color").is_empty());
	}

	#[rstest]
	fn test_name_length_counts_characters() {
		assert!(form("éé", "circle", "red").validate().is_ok());
	}

	#[rstest]
	fn test_long_name_rejected() {
		let long = "x".repeat(NAME_MAX_LENGTH + 1);
		let errors = form(&long, "circle", "red").validate().unwrap_err();

		assert_eq!(
			errors.get("name"),
			["Ensure this value has at most 255 characters (it has 256)."]
		);
	}

	#[rstest]
	#[case("hexagon", "red", "shape")]
	#[case("Circle", "red", "shape")]
	#[case("circle", "purple", "color")]
	fn test_invalid_choice_rejected(#[case] shape: &str, #[case] color: &str, #[case] field: &str) {
		let errors = form("Valid", shape, color).validate().unwrap_err();

		assert_eq!(errors.fields().collect::<Vec<_>>(), vec![field]);
		assert!(errors.get(field)[0].starts_with("Select a valid choice."));
	}

	#[rstest]
	fn test_missing_fields_all_reported() {
		let errors = EntryForm::default().validate().unwrap_err();

		for field in FIELDS {
			assert_eq!(errors.get(field), [REQUIRED]);
		}
	}

	#[rstest]
	fn test_by_field_lists_every_field() {
		let errors = form("A", "circle", "red").validate().unwrap_err();
		let by_field = errors.by_field();

		assert_eq!(by_field.len(), 3);
		assert_eq!(by_field["name"].len(), 1);
		assert!(by_field["shape"].is_empty());
	}
}
