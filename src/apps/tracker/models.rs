//! Entry model and its storage.
//!
//! The `tracker_entry` table holds every entry. Reads always come back
//! newest first; ties on `created_at` fall back to the higher `id`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sea_query::{
	Alias, ColumnDef, Expr, ExprTrait, Func, Index, Order, Query, SqliteQueryBuilder, Table,
};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

use crate::core::exception::Error;

pub const TABLE: &str = "tracker_entry";
pub const NAME_MAX_LENGTH: usize = 255;

/// Shape choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
	Triangle,
	Square,
	Circle,
}

/// Color choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
	Red,
	Blue,
	Green,
	Yellow,
}

/// A closed set of `(value, label)` pairs stored as text
pub trait Choice: Sized + Copy + 'static {
	const ALL: &'static [Self];

	fn value(self) -> &'static str;
	fn label(self) -> &'static str;

	fn from_value(value: &str) -> Option<Self> {
		Self::ALL.iter().copied().find(|choice| choice.value() == value)
	}
}

impl Choice for Shape {
	const ALL: &'static [Self] = &[Shape::Triangle, Shape::Square, Shape::Circle];

	fn value(self) -> &'static str {
		match self {
			Shape::Triangle => "triangle",
			Shape::Square => "square",
			Shape::Circle => "circle",
		}
	}

	fn label(self) -> &'static str {
		match self {
			Shape::Triangle => "Triangle",
			Shape::Square => "Square",
			Shape::Circle => "Circle",
		}
	}
}

impl Choice for Color {
	const ALL: &'static [Self] = &[Color::Red, Color::Blue, Color::Green, Color::Yellow];

	fn value(self) -> &'static str {
		match self {
			Color::Red => "red",
			Color::Blue => "blue",
			Color::Green => "green",
			Color::Yellow => "yellow",
		}
	}

	fn label(self) -> &'static str {
		match self {
			Color::Red => "Red",
			Color::Blue => "Blue",
			Color::Green => "Green",
			Color::Yellow => "Yellow",
		}
	}
}

macro_rules! choice_text_impls {
	($ty:ty) => {
		impl fmt::Display for $ty {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.value())
			}
		}

		impl FromStr for $ty {
			type Err = StoreError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				<$ty as Choice>::from_value(s).ok_or_else(|| {
					StoreError::Corrupt(format!("unknown {} '{}'", stringify!($ty), s))
				})
			}
		}
	};
}

choice_text_impls!(Shape);
choice_text_impls!(Color);

/// A persisted entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
	pub id: i64,
	pub name: String,
	pub shape: Shape,
	pub color: Color,
	pub created_at: DateTime<Utc>,
}

/// The user-set fields of an entry, already validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
	pub name: String,
	pub shape: Shape,
	pub color: Color,
}

impl NewEntry {
	pub fn new(name: impl Into<String>, shape: Shape, color: Color) -> Self {
		Self {
			name: name.into(),
			shape,
			color,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("Entry {0} does not exist")]
	NotFound(i64),

	#[error("Storage unavailable: {0}")]
	Unavailable(#[from] sqlx::Error),

	#[error("Query build error: {0}")]
	Query(String),

	#[error("Corrupt row: {0}")]
	Corrupt(String),
}

impl From<StoreError> for Error {
	fn from(error: StoreError) -> Self {
		match error {
			StoreError::NotFound(id) => Error::NotFound(format!("Entry {} does not exist", id)),
			other => Error::Database(other.to_string()),
		}
	}
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence contract for entries
#[async_trait]
pub trait EntryStore: Send + Sync {
	/// Every entry, newest first
	async fn list_all(&self) -> StoreResult<Vec<Entry>>;

	async fn get(&self, id: i64) -> StoreResult<Entry>;

	/// Insert a new entry; the store assigns `id` and `created_at`
	async fn create(&self, entry: NewEntry) -> StoreResult<Entry>;

	/// Replace the user-set fields; `id` and `created_at` never change
	async fn update(&self, id: i64, entry: NewEntry) -> StoreResult<Entry>;

	async fn delete(&self, id: i64) -> StoreResult<()>;

	async fn count(&self) -> StoreResult<u64>;
}

/// Timestamps are stored as fixed-width RFC 3339 so text order is time order
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
	timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(raw)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| StoreError::Corrupt(format!("invalid created_at '{}': {}", raw, e)))
}

fn columns() -> [Alias; 5] {
	[
		Alias::new("id"),
		Alias::new("name"),
		Alias::new("shape"),
		Alias::new("color"),
		Alias::new("created_at"),
	]
}

fn entry_from_row(row: &SqliteRow) -> StoreResult<Entry> {
	let shape: String = row.try_get("shape")?;
	let color: String = row.try_get("color")?;
	let created_at: String = row.try_get("created_at")?;

	Ok(Entry {
		id: row.try_get("id")?,
		name: row.try_get("name")?,
		shape: shape.parse()?,
		color: color.parse()?,
		created_at: parse_timestamp(&created_at)?,
	})
}

/// SQLite-backed entry store
#[derive(Clone)]
pub struct SqliteEntryStore {
	pool: SqlitePool,
}

impl SqliteEntryStore {
	/// Connect to `database_url`
	///
	/// # Examples
	///
	/// ```rust,no_run
	/// use tracker::apps::tracker::SqliteEntryStore;
	///
	/// # async fn example() {
	/// let store = SqliteEntryStore::connect("sqlite://tracker.db?mode=rwc", 5).await.unwrap();
	/// store.migrate().await.unwrap();
	/// # }
	/// ```
	pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
		let pool = SqlitePoolOptions::new()
			.max_connections(std::cmp::max(max_connections, 1))
			.connect(database_url)
			.await?;

		Ok(Self { pool })
	}

	/// Private in-memory database. A single connection that never expires
	/// keeps the data alive for the lifetime of the store.
	pub async fn in_memory() -> StoreResult<Self> {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.min_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect("sqlite::memory:")
			.await?;

		Ok(Self { pool })
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Create the entry table and its ordering index if they don't exist
	pub async fn migrate(&self) -> StoreResult<()> {
		let shape_values: Vec<Expr> = Shape::ALL.iter().map(|s| Expr::val(s.value())).collect();
		let color_values: Vec<Expr> = Color::ALL.iter().map(|c| Expr::val(c.value())).collect();

		let stmt = Table::create()
			.table(Alias::new(TABLE))
			.if_not_exists()
			.col(
				ColumnDef::new(Alias::new("id"))
					.integer()
					.not_null()
					.auto_increment()
					.primary_key(),
			)
			.col(
				ColumnDef::new(Alias::new("name"))
					.string_len(NAME_MAX_LENGTH as u32)
					.not_null(),
			)
			.col(
				ColumnDef::new(Alias::new("shape"))
					.string_len(100)
					.not_null()
					.check(Expr::col(Alias::new("shape")).is_in(shape_values)),
			)
			.col(
				ColumnDef::new(Alias::new("color"))
					.string_len(100)
					.not_null()
					.check(Expr::col(Alias::new("color")).is_in(color_values)),
			)
			.col(ColumnDef::new(Alias::new("created_at")).text().not_null())
			.to_owned();
		sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.execute(&self.pool)
			.await?;

		let idx = Index::create()
			.if_not_exists()
			.name("idx_tracker_entry_created_at")
			.table(Alias::new(TABLE))
			.col(Alias::new("created_at"))
			.to_owned();
		sqlx::query(&idx.to_string(SqliteQueryBuilder))
			.execute(&self.pool)
			.await?;

		tracing::debug!(table = TABLE, "schema ready");
		Ok(())
	}
}

#[async_trait]
impl EntryStore for SqliteEntryStore {
	async fn list_all(&self) -> StoreResult<Vec<Entry>> {
		let stmt = Query::select()
			.columns(columns())
			.from(Alias::new(TABLE))
			.order_by(Alias::new("created_at"), Order::Desc)
			.order_by(Alias::new("id"), Order::Desc)
			.to_owned();

		let rows = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.fetch_all(&self.pool)
			.await?;

		rows.iter().map(entry_from_row).collect()
	}

	async fn get(&self, id: i64) -> StoreResult<Entry> {
		let stmt = Query::select()
			.columns(columns())
			.from(Alias::new(TABLE))
			.and_where(Expr::col(Alias::new("id")).eq(id))
			.to_owned();

		let row = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some(row) => entry_from_row(&row),
			None => Err(StoreError::NotFound(id)),
		}
	}

	async fn create(&self, entry: NewEntry) -> StoreResult<Entry> {
		let created_at = Utc::now();

		let stmt = Query::insert()
			.into_table(Alias::new(TABLE))
			.columns([
				Alias::new("name"),
				Alias::new("shape"),
				Alias::new("color"),
				Alias::new("created_at"),
			])
			.values(
				[
					Expr::val(entry.name.as_str()),
					Expr::val(entry.shape.value()),
					Expr::val(entry.color.value()),
					Expr::val(format_timestamp(&created_at)),
				]
				.into_iter()
				.collect::<Vec<Expr>>(),
			)
			.map_err(|e| StoreError::Query(e.to_string()))?
			.to_owned();

		let result = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.execute(&self.pool)
			.await?;
		let id = result.last_insert_rowid();

		tracing::info!(id, name = %entry.name, shape = %entry.shape, color = %entry.color, "entry created");
		self.get(id).await
	}

	async fn update(&self, id: i64, entry: NewEntry) -> StoreResult<Entry> {
		let stmt = Query::update()
			.table(Alias::new(TABLE))
			.value(Alias::new("name"), entry.name.as_str())
			.value(Alias::new("shape"), entry.shape.value())
			.value(Alias::new("color"), entry.color.value())
			.and_where(Expr::col(Alias::new("id")).eq(id))
			.to_owned();

		let result = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.execute(&self.pool)
			.await?;
		if result.rows_affected() == 0 {
			return Err(StoreError::NotFound(id));
		}

		tracing::info!(id, name = %entry.name, shape = %entry.shape, color = %entry.color, "entry updated");
		self.get(id).await
	}

	async fn delete(&self, id: i64) -> StoreResult<()> {
		let stmt = Query::delete()
			.from_table(Alias::new(TABLE))
			.and_where(Expr::col(Alias::new("id")).eq(id))
			.to_owned();

		let result = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.execute(&self.pool)
			.await?;
		if result.rows_affected() == 0 {
			return Err(StoreError::NotFound(id));
		}

		tracing::info!(id, "entry deleted");
		Ok(())
	}

	async fn count(&self) -> StoreResult<u64> {
		let stmt = Query::select()
			.expr_as(Func::count(Expr::col(Alias::new("id"))), Alias::new("total"))
			.from(Alias::new(TABLE))
			.to_owned();

		let row = sqlx::query(&stmt.to_string(SqliteQueryBuilder))
			.fetch_one(&self.pool)
			.await?;
		let total: i64 = row.try_get("total")?;

		Ok(std::cmp::max(total, 0) as u64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};
	use std::sync::Arc;

	#[fixture]
	async fn store() -> SqliteEntryStore {
		let store = SqliteEntryStore::in_memory().await.unwrap();
		store.migrate().await.unwrap();
		store
	}

	#[rstest]
	#[case("triangle", Some(Shape::Triangle))]
	#[case("circle", Some(Shape::Circle))]
	#[case("Circle", None)]
	#[case("hexagon", None)]
	fn test_shape_from_value(#[case] raw: &str, #[case] expected: Option<Shape>) {
		assert_eq!(Shape::from_value(raw), expected);
	}

	#[rstest]
	fn test_color_values_and_labels() {
		let pairs: Vec<_> = Color::ALL.iter().map(|c| (c.value(), c.label())).collect();
		assert_eq!(
			pairs,
			vec![("red", "Red"), ("blue", "Blue"), ("green", "Green"), ("yellow", "Yellow")]
		);
	}

	#[rstest]
	fn test_timestamp_format_is_fixed_width() {
		let whole = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
		let fractional = DateTime::parse_from_rfc3339("2026-01-01T00:00:00.5Z").unwrap().with_timezone(&Utc);

		assert_eq!(format_timestamp(&whole), "2026-01-01T00:00:00.000000Z");
		assert!(format_timestamp(&whole) < format_timestamp(&fractional));
		assert_eq!(parse_timestamp(&format_timestamp(&fractional)).unwrap(), fractional);
	}

	#[rstest]
	#[tokio::test]
	async fn test_create_assigns_id_and_timestamp(#[future] store: SqliteEntryStore) {
		let store = store.await;
		let before = Utc::now();

		let entry = store
			.create(NewEntry::new("Al", Shape::Circle, Color::Red))
			.await
			.unwrap();

		assert!(entry.id > 0);
		assert_eq!(entry.name, "Al");
		assert_eq!(entry.shape, Shape::Circle);
		assert_eq!(entry.color, Color::Red);
		assert!(entry.created_at >= before - chrono::Duration::seconds(1));
		assert_eq!(store.count().await.unwrap(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_list_all_is_newest_first(#[future] store: SqliteEntryStore) {
		let store = store.await;
		for name in ["first", "second", "third"] {
			store
				.create(NewEntry::new(name, Shape::Square, Color::Blue))
				.await
				.unwrap();
		}

		let names: Vec<String> = store
			.list_all()
			.await
			.unwrap()
			.into_iter()
			.map(|entry| entry.name)
			.collect();

		assert_eq!(names, vec!["third", "second", "first"]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_keeps_id_and_created_at(#[future] store: SqliteEntryStore) {
		let store = store.await;
		let original = store
			.create(NewEntry::new("Box", Shape::Square, Color::Blue))
			.await
			.unwrap();

		let updated = store
			.update(original.id, NewEntry::new("Box2", Shape::Triangle, Color::Green))
			.await
			.unwrap();

		assert_eq!(updated.id, original.id);
		assert_eq!(updated.created_at, original.created_at);
		assert_eq!(updated.name, "Box2");
		assert_eq!(updated.shape, Shape::Triangle);
		assert_eq!(updated.color, Color::Green);
	}

	#[rstest]
	#[tokio::test]
	async fn test_update_leaves_other_entries_alone(#[future] store: SqliteEntryStore) {
		let store = store.await;
		let keep = store
			.create(NewEntry::new("Keep", Shape::Circle, Color::Yellow))
			.await
			.unwrap();
		let change = store
			.create(NewEntry::new("Change", Shape::Circle, Color::Yellow))
			.await
			.unwrap();

		store
			.update(change.id, NewEntry::new("Changed", Shape::Square, Color::Red))
			.await
			.unwrap();

		assert_eq!(store.get(keep.id).await.unwrap(), keep);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_ids_are_not_found(#[future] store: SqliteEntryStore) {
		let store = store.await;

		assert!(matches!(store.get(99).await, Err(StoreError::NotFound(99))));
		assert!(matches!(
			store
				.update(99, NewEntry::new("Nope", Shape::Circle, Color::Red))
				.await,
			Err(StoreError::NotFound(99))
		));
		assert!(matches!(store.delete(99).await, Err(StoreError::NotFound(99))));
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_twice(#[future] store: SqliteEntryStore) {
		let store = store.await;
		let entry = store
			.create(NewEntry::new("X", Shape::Circle, Color::Red))
			.await
			.unwrap();

		store.delete(entry.id).await.unwrap();

		assert!(store.list_all().await.unwrap().is_empty());
		assert!(matches!(
			store.delete(entry.id).await,
			Err(StoreError::NotFound(_))
		));
	}

	#[rstest]
	#[tokio::test]
	async fn test_check_constraint_rejects_raw_invalid_shape(#[future] store: SqliteEntryStore) {
		let store = store.await;
		let result = sqlx::query(
			"INSERT INTO tracker_entry (name, shape, color, created_at) \
			 VALUES ('Bad', 'hexagon', 'red', '2026-01-01T00:00:00.000000Z')",
		)
		.execute(store.pool())
		.await;

		assert!(result.is_err());
		assert_eq!(store.count().await.unwrap(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_migrate_is_idempotent(#[future] store: SqliteEntryStore) {
		let store = store.await;
		store.migrate().await.unwrap();
		assert_eq!(store.count().await.unwrap(), 0);
	}

	#[rstest]
	fn test_not_found_maps_to_view_error() {
		let error: Error = StoreError::NotFound(3).into();
		assert!(matches!(error, Error::NotFound(_)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_store_calls_run_on_spawned_tasks(#[future] store: SqliteEntryStore) {
		let store: Arc<dyn EntryStore> = Arc::new(store.await);

		let writer = store.clone();
		let created = tokio::spawn(async move {
			writer.create(NewEntry::new("Spawned", Shape::Circle, Color::Red)).await
		})
		.await
		.unwrap()
		.unwrap();

		let reader = store.clone();
		let (listed, total) = tokio::spawn(async move {
			let listed = reader.list_all().await.unwrap();
			let total = reader.count().await.unwrap();
			(listed, total)
		})
		.await
		.unwrap();

		assert_eq!(listed, vec![created]);
		assert_eq!(total, 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_connect_clamps_zero_max_connections() {
		let store = SqliteEntryStore::connect("sqlite::memory:", 0).await.unwrap();

		assert_eq!(store.pool().options().get_max_connections(), 1);
	}
}
