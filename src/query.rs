//! Chainable query builders for the side tables
//!
//! One builder per table, each following the same shape: `filter_*` methods
//! accumulate equality conditions, `order_by_*` methods accumulate sort
//! keys, and the terminal methods (`all`, `first`, `get`, `count`,
//! `exists`) build the statement with sea-query and run it on the pool.
//!
//! `get` is the strict variant: it returns the typed not-found error when
//! no row matches, mirroring the strict single-row lookups the traversal
//! helpers are built on. `first` returns `Option` for the probing callers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use datatrans::query::LanguageQuery;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sqlx::AnyPool::connect("sqlite::memory:").await?;
//! let language = LanguageQuery::new(Arc::new(pool))
//!     .filter_iso2("FR")
//!     .get()
//!     .await?;
//! println!("{} ({})", language.name, language.locale);
//! # Ok(())
//! # }
//! ```

use sea_query::{
	Alias, BinOper, Condition, Expr, ExprTrait, Func, Order, Query as SeaQuery, SelectStatement,
	SqliteQueryBuilder,
};
use sqlx::AnyPool;
use std::sync::Arc;

use crate::error::TranslationError;
use crate::models::{
	FIELDS_TABLE, Field, ITEMS_TABLE, Item, LANGUAGES_TABLE, Language, TRANSLATIONS_TABLE,
	Translation,
};

#[derive(Debug, Clone, Copy)]
enum Direction {
	Asc,
	Desc,
}

impl Direction {
	fn order(self) -> Order {
		match self {
			Self::Asc => Order::Asc,
			Self::Desc => Order::Desc,
		}
	}
}

pub(crate) fn eq(column: &str, value: impl Into<sea_query::Value>) -> Condition {
	Condition::all().add(Expr::col(Alias::new(column)).binary(BinOper::Equal, Expr::val(value)))
}

async fn run_count(statement: SelectStatement, pool: &AnyPool) -> Result<i64, TranslationError> {
	let sql = statement.to_string(SqliteQueryBuilder);
	let row = sqlx::query(&sql).fetch_one(pool).await?;
	let count: i64 = sqlx::Row::try_get(&row, 0)?;
	Ok(count)
}

// ----------------------------------------------------------------------------
// Fields
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum FieldFilter {
	Id(i64),
	ContentType(i64),
	Name(String),
}

/// Query builder for `ddt_fields`.
///
/// Unordered listings fall back to the table's natural ordering
/// (content type, then name).
#[derive(Clone)]
pub struct FieldQuery {
	pool: Arc<AnyPool>,
	filters: Vec<FieldFilter>,
	order_by: Vec<(FieldColumn, Direction)>,
	limit: Option<u64>,
	offset: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
enum FieldColumn {
	ContentType,
	Name,
}

impl FieldColumn {
	fn name(self) -> &'static str {
		match self {
			Self::ContentType => "content_type_id",
			Self::Name => "name",
		}
	}
}

impl FieldQuery {
	pub fn new(pool: Arc<AnyPool>) -> Self {
		Self {
			pool,
			filters: Vec::new(),
			order_by: Vec::new(),
			limit: None,
			offset: None,
		}
	}

	pub fn filter_id(mut self, id: i64) -> Self {
		self.filters.push(FieldFilter::Id(id));
		self
	}

	pub fn filter_content_type(mut self, content_type_id: i64) -> Self {
		self.filters.push(FieldFilter::ContentType(content_type_id));
		self
	}

	pub fn filter_name(mut self, name: impl Into<String>) -> Self {
		self.filters.push(FieldFilter::Name(name.into()));
		self
	}

	pub fn order_by_name(mut self) -> Self {
		self.order_by.push((FieldColumn::Name, Direction::Asc));
		self
	}

	pub fn order_by_content_type(mut self) -> Self {
		self.order_by
			.push((FieldColumn::ContentType, Direction::Asc));
		self
	}

	pub fn order_by_name_desc(mut self) -> Self {
		self.order_by.push((FieldColumn::Name, Direction::Desc));
		self
	}

	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn offset(mut self, offset: u64) -> Self {
		self.offset = Some(offset);
		self
	}

	fn condition(filter: &FieldFilter) -> Condition {
		match filter {
			FieldFilter::Id(id) => eq("id", *id),
			FieldFilter::ContentType(id) => eq("content_type_id", *id),
			FieldFilter::Name(name) => eq("name", name.as_str()),
		}
	}

	fn build_select(&self) -> SelectStatement {
		let mut query = SeaQuery::select()
			.columns([
				Alias::new("id"),
				Alias::new("content_type_id"),
				Alias::new("name"),
			])
			.from(Alias::new(FIELDS_TABLE))
			.to_owned();
		for filter in &self.filters {
			query.cond_where(Self::condition(filter));
		}
		if self.order_by.is_empty() {
			query.order_by(Alias::new("content_type_id"), Order::Asc);
			query.order_by(Alias::new("name"), Order::Asc);
		} else {
			for (column, direction) in &self.order_by {
				query.order_by(Alias::new(column.name()), direction.order());
			}
		}
		if let Some(limit) = self.limit {
			query.limit(limit);
		}
		if let Some(offset) = self.offset {
			query.offset(offset);
		}
		query
	}

	pub async fn all(&self) -> Result<Vec<Field>, TranslationError> {
		let sql = self.build_select().to_string(SqliteQueryBuilder);
		let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;
		rows.iter()
			.map(|row| Field::from_row(row).map_err(TranslationError::from))
			.collect()
	}

	pub async fn first(&self) -> Result<Option<Field>, TranslationError> {
		let mut query = self.clone();
		query.limit = Some(1);
		Ok(query.all().await?.into_iter().next())
	}

	/// Single-row lookup; not-found is an error
	pub async fn get(&self) -> Result<Field, TranslationError> {
		self.first()
			.await?
			.ok_or_else(|| TranslationError::FieldNotFound(format!("{:?}", self.filters)))
	}

	pub async fn count(&self) -> Result<i64, TranslationError> {
		let mut query = SeaQuery::select()
			.expr(Func::count(Expr::col(Alias::new("id"))))
			.from(Alias::new(FIELDS_TABLE))
			.to_owned();
		for filter in &self.filters {
			query.cond_where(Self::condition(filter));
		}
		run_count(query, &self.pool).await
	}

	pub async fn exists(&self) -> Result<bool, TranslationError> {
		Ok(self.count().await? > 0)
	}
}

// ----------------------------------------------------------------------------
// Items
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum ItemFilter {
	Id(i64),
	Field(i64),
	FieldIn(Vec<i64>),
	Object(i64),
	ContentType(i64),
}

/// Query builder for `ddt_items`
#[derive(Clone)]
pub struct ItemQuery {
	pool: Arc<AnyPool>,
	filters: Vec<ItemFilter>,
	limit: Option<u64>,
	offset: Option<u64>,
}

impl ItemQuery {
	pub fn new(pool: Arc<AnyPool>) -> Self {
		Self {
			pool,
			filters: Vec::new(),
			limit: None,
			offset: None,
		}
	}

	pub fn filter_id(mut self, id: i64) -> Self {
		self.filters.push(ItemFilter::Id(id));
		self
	}

	pub fn filter_field(mut self, field_id: i64) -> Self {
		self.filters.push(ItemFilter::Field(field_id));
		self
	}

	/// Restrict to items whose field is one of `field_ids`
	pub fn filter_field_in(mut self, field_ids: Vec<i64>) -> Self {
		self.filters.push(ItemFilter::FieldIn(field_ids));
		self
	}

	pub fn filter_object(mut self, object_id: i64) -> Self {
		self.filters.push(ItemFilter::Object(object_id));
		self
	}

	pub fn filter_content_type(mut self, content_type_id: i64) -> Self {
		self.filters.push(ItemFilter::ContentType(content_type_id));
		self
	}

	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn offset(mut self, offset: u64) -> Self {
		self.offset = Some(offset);
		self
	}

	fn condition(filter: &ItemFilter) -> Condition {
		match filter {
			ItemFilter::Id(id) => eq("id", *id),
			ItemFilter::Field(id) => eq("field_id", *id),
			ItemFilter::FieldIn(ids) => {
				Condition::all().add(Expr::col(Alias::new("field_id")).is_in(ids.iter().copied()))
			}
			ItemFilter::Object(id) => eq("object_id", *id),
			ItemFilter::ContentType(id) => eq("content_type_id", *id),
		}
	}

	fn build_select(&self) -> SelectStatement {
		let mut query = SeaQuery::select()
			.columns([
				Alias::new("id"),
				Alias::new("field_id"),
				Alias::new("object_id"),
				Alias::new("content_type_id"),
			])
			.from(Alias::new(ITEMS_TABLE))
			.to_owned();
		for filter in &self.filters {
			query.cond_where(Self::condition(filter));
		}
		query.order_by(Alias::new("id"), Order::Asc);
		if let Some(limit) = self.limit {
			query.limit(limit);
		}
		if let Some(offset) = self.offset {
			query.offset(offset);
		}
		query
	}

	pub async fn all(&self) -> Result<Vec<Item>, TranslationError> {
		let sql = self.build_select().to_string(SqliteQueryBuilder);
		let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;
		rows.iter()
			.map(|row| Item::from_row(row).map_err(TranslationError::from))
			.collect()
	}

	pub async fn first(&self) -> Result<Option<Item>, TranslationError> {
		let mut query = self.clone();
		query.limit = Some(1);
		Ok(query.all().await?.into_iter().next())
	}

	/// Single-row lookup; not-found is an error
	pub async fn get(&self) -> Result<Item, TranslationError> {
		self.first()
			.await?
			.ok_or_else(|| TranslationError::ItemNotFound(format!("{:?}", self.filters)))
	}

	pub async fn count(&self) -> Result<i64, TranslationError> {
		let mut query = SeaQuery::select()
			.expr(Func::count(Expr::col(Alias::new("id"))))
			.from(Alias::new(ITEMS_TABLE))
			.to_owned();
		for filter in &self.filters {
			query.cond_where(Self::condition(filter));
		}
		run_count(query, &self.pool).await
	}

	pub async fn exists(&self) -> Result<bool, TranslationError> {
		Ok(self.count().await? > 0)
	}
}

// ----------------------------------------------------------------------------
// Languages
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum LanguageFilter {
	Id(i64),
	Name(String),
	Iso2(String),
	Iso3(String),
	Locale(String),
}

/// Query builder for `ddt_languages`.
///
/// ISO filters are matched against the stored uppercase form, so lowercase
/// input finds the row. Unordered listings sort by name.
#[derive(Clone)]
pub struct LanguageQuery {
	pool: Arc<AnyPool>,
	filters: Vec<LanguageFilter>,
	limit: Option<u64>,
	offset: Option<u64>,
}

impl LanguageQuery {
	pub fn new(pool: Arc<AnyPool>) -> Self {
		Self {
			pool,
			filters: Vec::new(),
			limit: None,
			offset: None,
		}
	}

	pub fn filter_id(mut self, id: i64) -> Self {
		self.filters.push(LanguageFilter::Id(id));
		self
	}

	pub fn filter_name(mut self, name: impl Into<String>) -> Self {
		self.filters.push(LanguageFilter::Name(name.into()));
		self
	}

	pub fn filter_iso2(mut self, iso2: impl Into<String>) -> Self {
		self.filters
			.push(LanguageFilter::Iso2(crate::models::normalize_iso(&iso2.into())));
		self
	}

	pub fn filter_iso3(mut self, iso3: impl Into<String>) -> Self {
		self.filters
			.push(LanguageFilter::Iso3(crate::models::normalize_iso(&iso3.into())));
		self
	}

	pub fn filter_locale(mut self, locale: impl Into<String>) -> Self {
		self.filters.push(LanguageFilter::Locale(locale.into()));
		self
	}

	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn offset(mut self, offset: u64) -> Self {
		self.offset = Some(offset);
		self
	}

	fn condition(filter: &LanguageFilter) -> Condition {
		match filter {
			LanguageFilter::Id(id) => eq("id", *id),
			LanguageFilter::Name(name) => eq("name", name.as_str()),
			LanguageFilter::Iso2(iso2) => eq("iso2", iso2.as_str()),
			LanguageFilter::Iso3(iso3) => eq("iso3", iso3.as_str()),
			LanguageFilter::Locale(locale) => eq("locale", locale.as_str()),
		}
	}

	fn build_select(&self) -> SelectStatement {
		let mut query = SeaQuery::select()
			.columns([
				Alias::new("id"),
				Alias::new("name"),
				Alias::new("iso2"),
				Alias::new("iso3"),
				Alias::new("locale"),
			])
			.from(Alias::new(LANGUAGES_TABLE))
			.to_owned();
		for filter in &self.filters {
			query.cond_where(Self::condition(filter));
		}
		query.order_by(Alias::new("name"), Order::Asc);
		if let Some(limit) = self.limit {
			query.limit(limit);
		}
		if let Some(offset) = self.offset {
			query.offset(offset);
		}
		query
	}

	pub async fn all(&self) -> Result<Vec<Language>, TranslationError> {
		let sql = self.build_select().to_string(SqliteQueryBuilder);
		let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;
		rows.iter()
			.map(|row| Language::from_row(row).map_err(TranslationError::from))
			.collect()
	}

	pub async fn first(&self) -> Result<Option<Language>, TranslationError> {
		let mut query = self.clone();
		query.limit = Some(1);
		Ok(query.all().await?.into_iter().next())
	}

	/// Single-row lookup; not-found is an error
	pub async fn get(&self) -> Result<Language, TranslationError> {
		self.first()
			.await?
			.ok_or_else(|| TranslationError::LanguageNotFound(format!("{:?}", self.filters)))
	}

	pub async fn count(&self) -> Result<i64, TranslationError> {
		let mut query = SeaQuery::select()
			.expr(Func::count(Expr::col(Alias::new("id"))))
			.from(Alias::new(LANGUAGES_TABLE))
			.to_owned();
		for filter in &self.filters {
			query.cond_where(Self::condition(filter));
		}
		run_count(query, &self.pool).await
	}

	pub async fn exists(&self) -> Result<bool, TranslationError> {
		Ok(self.count().await? > 0)
	}
}

// ----------------------------------------------------------------------------
// Translations
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum TranslationFilter {
	Id(i64),
	Item(i64),
	ItemIn(Vec<i64>),
	Language(i64),
	/// Items of one field, via a subquery on `ddt_items`
	Field(i64),
	Missing,
}

/// Query builder for `ddt_translations`.
///
/// `filter_missing` narrows to rows whose text is still empty, which is the
/// definition of a missing translation everywhere in this crate.
#[derive(Clone)]
pub struct TranslationQuery {
	pool: Arc<AnyPool>,
	filters: Vec<TranslationFilter>,
	limit: Option<u64>,
	offset: Option<u64>,
}

impl TranslationQuery {
	pub fn new(pool: Arc<AnyPool>) -> Self {
		Self {
			pool,
			filters: Vec::new(),
			limit: None,
			offset: None,
		}
	}

	pub fn filter_id(mut self, id: i64) -> Self {
		self.filters.push(TranslationFilter::Id(id));
		self
	}

	pub fn filter_item(mut self, item_id: i64) -> Self {
		self.filters.push(TranslationFilter::Item(item_id));
		self
	}

	pub fn filter_item_in(mut self, item_ids: Vec<i64>) -> Self {
		self.filters.push(TranslationFilter::ItemIn(item_ids));
		self
	}

	pub fn filter_language(mut self, language_id: i64) -> Self {
		self.filters.push(TranslationFilter::Language(language_id));
		self
	}

	/// Restrict to translations belonging to one field's items
	pub fn filter_field(mut self, field_id: i64) -> Self {
		self.filters.push(TranslationFilter::Field(field_id));
		self
	}

	/// Restrict to rows with empty text
	pub fn filter_missing(mut self) -> Self {
		self.filters.push(TranslationFilter::Missing);
		self
	}

	pub fn limit(mut self, limit: u64) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn offset(mut self, offset: u64) -> Self {
		self.offset = Some(offset);
		self
	}

	fn condition(filter: &TranslationFilter) -> Condition {
		match filter {
			TranslationFilter::Id(id) => eq("id", *id),
			TranslationFilter::Item(id) => eq("item_id", *id),
			TranslationFilter::ItemIn(ids) => {
				Condition::all().add(Expr::col(Alias::new("item_id")).is_in(ids.iter().copied()))
			}
			TranslationFilter::Language(id) => eq("language_id", *id),
			TranslationFilter::Field(field_id) => Condition::all().add(
				Expr::col(Alias::new("item_id")).in_subquery(
					SeaQuery::select()
						.column(Alias::new("id"))
						.from(Alias::new(ITEMS_TABLE))
						.cond_where(eq("field_id", *field_id))
						.to_owned(),
				),
			),
			TranslationFilter::Missing => eq("text", ""),
		}
	}

	fn build_select(&self) -> SelectStatement {
		let mut query = SeaQuery::select()
			.columns([
				Alias::new("id"),
				Alias::new("language_id"),
				Alias::new("item_id"),
				Alias::new("text"),
			])
			.from(Alias::new(TRANSLATIONS_TABLE))
			.to_owned();
		for filter in &self.filters {
			query.cond_where(Self::condition(filter));
		}
		query.order_by(Alias::new("id"), Order::Asc);
		if let Some(limit) = self.limit {
			query.limit(limit);
		}
		if let Some(offset) = self.offset {
			query.offset(offset);
		}
		query
	}

	pub async fn all(&self) -> Result<Vec<Translation>, TranslationError> {
		let sql = self.build_select().to_string(SqliteQueryBuilder);
		let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;
		rows.iter()
			.map(|row| Translation::from_row(row).map_err(TranslationError::from))
			.collect()
	}

	pub async fn first(&self) -> Result<Option<Translation>, TranslationError> {
		let mut query = self.clone();
		query.limit = Some(1);
		Ok(query.all().await?.into_iter().next())
	}

	/// Single-row lookup; not-found is an error
	pub async fn get(&self) -> Result<Translation, TranslationError> {
		self.first()
			.await?
			.ok_or_else(|| TranslationError::TranslationNotFound(format!("{:?}", self.filters)))
	}

	pub async fn count(&self) -> Result<i64, TranslationError> {
		let mut query = SeaQuery::select()
			.expr(Func::count(Expr::col(Alias::new("id"))))
			.from(Alias::new(TRANSLATIONS_TABLE))
			.to_owned();
		for filter in &self.filters {
			query.cond_where(Self::condition(filter));
		}
		run_count(query, &self.pool).await
	}

	pub async fn exists(&self) -> Result<bool, TranslationError> {
		Ok(self.count().await? > 0)
	}
}
