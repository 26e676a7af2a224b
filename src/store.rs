//! The write side: row creation, deletion and the cascade reactions
//!
//! [`TranslationStore`] owns the pool and is the only component that writes
//! the side tables. Field and Language rows are created on explicit request;
//! Item and Translation rows exist purely as cascade reactions:
//!
//! - creating a Field back-fills one Item per existing instance of the
//!   model, and one Translation per Item×Language;
//! - creating a Language back-fills one empty Translation per Item;
//! - registering a new instance back-fills its Items and Translations;
//! - deletes close over dependents (Field → Items → Translations,
//!   Language → Translations, instance → Items → Translations).
//!
//! The schema also declares `ON DELETE CASCADE`, but deletes here always
//! perform the closure themselves: the `Any` driver does not guarantee
//! foreign-key enforcement on every backend configuration.

use sea_query::{Alias, Condition, Expr, ExprTrait, Query as SeaQuery, SqliteQueryBuilder, Value};
use sqlx::AnyPool;
use sqlx::Row;
use std::sync::Arc;

use crate::contenttypes::{ContentType, ContentTypeRegistry, RegisteredModel, Translatable};
use crate::error::TranslationError;
use crate::models::{
	CONTENT_TYPES_TABLE, FIELDS_TABLE, Field, ITEMS_TABLE, Item, LANGUAGES_TABLE, Language,
	TRANSLATIONS_TABLE, Translation, normalize_iso,
};
use crate::query::{FieldQuery, ItemQuery, LanguageQuery, TranslationQuery, eq};
use crate::schema::{self, SqlBackend};

pub(crate) fn require_id(content_type: &ContentType) -> Result<i64, TranslationError> {
	content_type.id.ok_or_else(|| {
		TranslationError::ContentTypeNotFound(format!("{} has not been persisted", content_type))
	})
}

/// Entry point for all writes against the translation side tables.
///
/// ## Example
///
/// ```rust,no_run
/// use datatrans::contenttypes::{ContentType, ContentTypeRegistry, Translatable};
/// use datatrans::schema::SqlBackend;
/// use datatrans::store::TranslationStore;
/// use std::sync::Arc;
///
/// struct Article {
///     id: i64,
/// }
///
/// impl Translatable for Article {
///     fn content_type() -> ContentType {
///         ContentType::new("blog", "article")
///     }
///     fn table_name() -> &'static str {
///         "blog_articles"
///     }
///     fn object_id(&self) -> i64 {
///         self.id
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = Arc::new(sqlx::AnyPool::connect("sqlite::memory:").await?);
/// let registry = Arc::new(ContentTypeRegistry::new());
/// registry.register::<Article>();
///
/// let store = TranslationStore::new(pool, registry);
/// store.ensure_schema(SqlBackend::Sqlite).await?;
///
/// store.create_language("French", "fr", "fra", "fr-FR").await?;
/// let field = store.create_field_for::<Article>("title").await?;
/// println!("items: {}", store.count_items(&field).await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TranslationStore {
	pool: Arc<AnyPool>,
	registry: Arc<ContentTypeRegistry>,
}

impl TranslationStore {
	pub fn new(pool: Arc<AnyPool>, registry: Arc<ContentTypeRegistry>) -> Self {
		Self { pool, registry }
	}

	/// Handle to the underlying pool, for reads and for the owning tables.
	///
	/// Writes to the cascade-managed side tables must go through the
	/// store's create/delete methods, or through
	/// [`TranslationStore::bulk_insert`] for multi-row statements. Callers
	/// that build their own statements against the pool are expected to
	/// consult [`TranslationStore::check_bulk_insert`] first.
	pub fn pool(&self) -> Arc<AnyPool> {
		self.pool.clone()
	}

	pub fn registry(&self) -> &ContentTypeRegistry {
		&self.registry
	}

	/// Create the side tables if they do not exist yet
	pub async fn ensure_schema(&self, backend: SqlBackend) -> Result<(), TranslationError> {
		schema::create_tables(&self.pool, backend).await
	}

	// ------------------------------------------------------------------
	// Query builders
	// ------------------------------------------------------------------

	pub fn fields(&self) -> FieldQuery {
		FieldQuery::new(self.pool.clone())
	}

	pub fn items(&self) -> ItemQuery {
		ItemQuery::new(self.pool.clone())
	}

	pub fn languages(&self) -> LanguageQuery {
		LanguageQuery::new(self.pool.clone())
	}

	pub fn translations(&self) -> TranslationQuery {
		TranslationQuery::new(self.pool.clone())
	}

	// ------------------------------------------------------------------
	// Content types
	// ------------------------------------------------------------------

	/// Get or create the persisted content type row for a descriptor
	pub async fn content_type(
		&self,
		app_label: &str,
		model: &str,
	) -> Result<ContentType, TranslationError> {
		if let Some(content_type) = self.fetch_content_type(app_label, model).await? {
			return Ok(content_type);
		}
		let statement = SeaQuery::insert()
			.into_table(Alias::new(CONTENT_TYPES_TABLE))
			.columns([Alias::new("app_label"), Alias::new("model")])
			.values([app_label.to_string().into(), model.to_string().into()])
			.expect("column and value arity match")
			.to_owned();
		sqlx::query(&statement.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;
		self.fetch_content_type(app_label, model).await?.ok_or_else(|| {
			TranslationError::ContentTypeNotFound(format!("{app_label}.{model}"))
		})
	}

	/// Get or create the content type row for a registered model type
	pub async fn content_type_of<T: Translatable>(&self) -> Result<ContentType, TranslationError> {
		let descriptor = T::content_type();
		self.content_type(&descriptor.app_label, &descriptor.model)
			.await
	}

	async fn fetch_content_type(
		&self,
		app_label: &str,
		model: &str,
	) -> Result<Option<ContentType>, TranslationError> {
		let statement = SeaQuery::select()
			.columns([
				Alias::new("id"),
				Alias::new("app_label"),
				Alias::new("model"),
			])
			.from(Alias::new(CONTENT_TYPES_TABLE))
			.cond_where(eq("app_label", app_label))
			.cond_where(eq("model", model))
			.to_owned();
		let row = sqlx::query(&statement.to_string(SqliteQueryBuilder))
			.fetch_optional(&*self.pool)
			.await?;
		match row {
			Some(row) => Ok(Some(ContentType {
				id: Some(row.try_get("id")?),
				app_label: row.try_get("app_label")?,
				model: row.try_get("model")?,
			})),
			None => Ok(None),
		}
	}

	// ------------------------------------------------------------------
	// Fields
	// ------------------------------------------------------------------

	/// Declare one attribute of a model translatable.
	///
	/// Back-fills one Item per existing row of the model's table and one
	/// empty Translation per Item×Language. The model must be registered,
	/// otherwise existing rows cannot be enumerated.
	pub async fn create_field(
		&self,
		content_type: &ContentType,
		name: &str,
	) -> Result<Field, TranslationError> {
		let content_type_id = require_id(content_type)?;
		let entry = self
			.registry
			.get(&content_type.app_label, &content_type.model)
			.ok_or_else(|| TranslationError::UnregisteredModel {
				app_label: content_type.app_label.clone(),
				model: content_type.model.clone(),
			})?;

		let statement = SeaQuery::insert()
			.into_table(Alias::new(FIELDS_TABLE))
			.columns([Alias::new("content_type_id"), Alias::new("name")])
			.values([content_type_id.into(), name.to_string().into()])
			.expect("column and value arity match")
			.to_owned();
		sqlx::query(&statement.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;
		let field = self
			.fields()
			.filter_content_type(content_type_id)
			.filter_name(name)
			.get()
			.await?;

		let object_ids = self.enumerate_objects(&entry).await?;
		let languages = self.languages().all().await?;
		for object_id in &object_ids {
			let item = self
				.insert_item(field.id, *object_id, content_type_id)
				.await?;
			for language in &languages {
				self.insert_translation(language.id, item.id).await?;
			}
		}
		tracing::debug!(
			field = %field.qualified_name(content_type),
			items = object_ids.len(),
			languages = languages.len(),
			"created translatable field"
		);
		Ok(field)
	}

	/// [`TranslationStore::create_field`] with the descriptor taken from
	/// the type
	pub async fn create_field_for<T: Translatable>(
		&self,
		name: &str,
	) -> Result<Field, TranslationError> {
		let content_type = self.content_type_of::<T>().await?;
		self.create_field(&content_type, name).await
	}

	/// Delete a field and close over its items and their translations
	pub async fn delete_field(&self, field: &Field) -> Result<(), TranslationError> {
		let translations = SeaQuery::delete()
			.from_table(Alias::new(TRANSLATIONS_TABLE))
			.cond_where(
				Condition::all().add(
					Expr::col(Alias::new("item_id")).in_subquery(
						SeaQuery::select()
							.column(Alias::new("id"))
							.from(Alias::new(ITEMS_TABLE))
							.cond_where(eq("field_id", field.id))
							.to_owned(),
					),
				),
			)
			.to_owned();
		sqlx::query(&translations.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;

		let items = SeaQuery::delete()
			.from_table(Alias::new(ITEMS_TABLE))
			.cond_where(eq("field_id", field.id))
			.to_owned();
		sqlx::query(&items.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;

		let fields = SeaQuery::delete()
			.from_table(Alias::new(FIELDS_TABLE))
			.cond_where(eq("id", field.id))
			.to_owned();
		sqlx::query(&fields.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;

		tracing::debug!(field = %field.name, "deleted translatable field and dependents");
		Ok(())
	}

	// ------------------------------------------------------------------
	// Languages
	// ------------------------------------------------------------------

	/// Add a language.
	///
	/// ISO codes are stored uppercase regardless of input case. Every
	/// existing Item is back-filled with an empty Translation for the new
	/// language.
	pub async fn create_language(
		&self,
		name: &str,
		iso2: &str,
		iso3: &str,
		locale: &str,
	) -> Result<Language, TranslationError> {
		let statement = SeaQuery::insert()
			.into_table(Alias::new(LANGUAGES_TABLE))
			.columns([
				Alias::new("name"),
				Alias::new("iso2"),
				Alias::new("iso3"),
				Alias::new("locale"),
			])
			.values([
				name.to_string().into(),
				normalize_iso(iso2).into(),
				normalize_iso(iso3).into(),
				locale.to_string().into(),
			])
			.expect("column and value arity match")
			.to_owned();
		sqlx::query(&statement.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;
		let language = self.languages().filter_name(name).get().await?;

		let items = self.items().all().await?;
		for item in &items {
			self.insert_translation(language.id, item.id).await?;
		}
		tracing::debug!(
			language = %language.name,
			locale = %language.locale,
			backfilled = items.len(),
			"created language"
		);
		Ok(language)
	}

	/// Delete a language and all of its translations
	pub async fn delete_language(&self, language: &Language) -> Result<(), TranslationError> {
		let translations = SeaQuery::delete()
			.from_table(Alias::new(TRANSLATIONS_TABLE))
			.cond_where(eq("language_id", language.id))
			.to_owned();
		sqlx::query(&translations.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;

		let languages = SeaQuery::delete()
			.from_table(Alias::new(LANGUAGES_TABLE))
			.cond_where(eq("id", language.id))
			.to_owned();
		sqlx::query(&languages.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;

		tracing::debug!(language = %language.name, "deleted language and its translations");
		Ok(())
	}

	// ------------------------------------------------------------------
	// Instances
	// ------------------------------------------------------------------

	/// Back-fill Items and Translations for one instance.
	///
	/// Called after the owning object is inserted; idempotent for
	/// instances that already have their rows.
	pub async fn sync_instance<T: Translatable>(
		&self,
		instance: &T,
	) -> Result<Vec<Item>, TranslationError> {
		let content_type = self.content_type_of::<T>().await?;
		let content_type_id = require_id(&content_type)?;
		let fields = self
			.fields()
			.filter_content_type(content_type_id)
			.all()
			.await?;
		let languages = self.languages().all().await?;

		let mut items = Vec::with_capacity(fields.len());
		for field in &fields {
			let existing = self
				.items()
				.filter_field(field.id)
				.filter_object(instance.object_id())
				.first()
				.await?;
			let item = match existing {
				Some(item) => item,
				None => {
					let item = self
						.insert_item(field.id, instance.object_id(), content_type_id)
						.await?;
					for language in &languages {
						self.insert_translation(language.id, item.id).await?;
					}
					item
				}
			};
			items.push(item);
		}
		Ok(items)
	}

	/// Drop the Items and Translations of one instance, after the owning
	/// object is deleted
	pub async fn remove_instance<T: Translatable>(
		&self,
		instance: &T,
	) -> Result<(), TranslationError> {
		let content_type = self.content_type_of::<T>().await?;
		let content_type_id = require_id(&content_type)?;

		let translations = SeaQuery::delete()
			.from_table(Alias::new(TRANSLATIONS_TABLE))
			.cond_where(
				Condition::all().add(
					Expr::col(Alias::new("item_id")).in_subquery(
						SeaQuery::select()
							.column(Alias::new("id"))
							.from(Alias::new(ITEMS_TABLE))
							.cond_where(eq("content_type_id", content_type_id))
							.cond_where(eq("object_id", instance.object_id()))
							.to_owned(),
					),
				),
			)
			.to_owned();
		sqlx::query(&translations.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;

		let items = SeaQuery::delete()
			.from_table(Alias::new(ITEMS_TABLE))
			.cond_where(eq("content_type_id", content_type_id))
			.cond_where(eq("object_id", instance.object_id()))
			.to_owned();
		sqlx::query(&items.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;
		Ok(())
	}

	// ------------------------------------------------------------------
	// Translations
	// ------------------------------------------------------------------

	/// Replace the text of one translation
	pub async fn set_translation_text(
		&self,
		translation: &Translation,
		text: &str,
	) -> Result<Translation, TranslationError> {
		let statement = SeaQuery::update()
			.table(Alias::new(TRANSLATIONS_TABLE))
			.value(Alias::new("text"), text.to_string())
			.cond_where(eq("id", translation.id))
			.to_owned();
		sqlx::query(&statement.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;
		self.translations().filter_id(translation.id).get().await
	}

	// ------------------------------------------------------------------
	// Counts
	// ------------------------------------------------------------------

	/// Items attached to a field
	pub async fn count_items(&self, field: &Field) -> Result<i64, TranslationError> {
		self.items().filter_field(field.id).count().await
	}

	/// Empty translations under a field
	pub async fn count_missing_for_field(&self, field: &Field) -> Result<i64, TranslationError> {
		self.translations()
			.filter_field(field.id)
			.filter_missing()
			.count()
			.await
	}

	/// Empty translations of an item
	pub async fn count_missing_for_item(&self, item: &Item) -> Result<i64, TranslationError> {
		self.translations()
			.filter_item(item.id)
			.filter_missing()
			.count()
			.await
	}

	/// Empty translations in a language
	pub async fn count_missing_for_language(
		&self,
		language: &Language,
	) -> Result<i64, TranslationError> {
		self.translations()
			.filter_language(language.id)
			.filter_missing()
			.count()
			.await
	}

	// ------------------------------------------------------------------
	// Bulk insertion
	// ------------------------------------------------------------------

	/// Multi-row insert, gated by the cascade policy.
	///
	/// The one bulk path through the store: every call is checked with
	/// [`TranslationStore::check_bulk_insert`], so the cascade-managed
	/// tables (fields, items, languages) are refused. Each row is a value
	/// list matching `columns`. Returns the number of inserted rows.
	pub async fn bulk_insert(
		&self,
		table: &str,
		columns: &[&str],
		rows: Vec<Vec<Value>>,
	) -> Result<u64, TranslationError> {
		Self::check_bulk_insert(table)?;
		if rows.is_empty() {
			return Ok(0);
		}
		for row in &rows {
			if row.len() != columns.len() {
				return Err(TranslationError::BulkRowMismatch {
					expected: columns.len(),
					got: row.len(),
				});
			}
		}
		let mut statement = SeaQuery::insert()
			.into_table(Alias::new(table))
			.columns(columns.iter().map(|column| Alias::new(*column)))
			.to_owned();
		for row in rows {
			statement
				.values(row.into_iter().map(Expr::val))
				.expect("row arity checked against the column list");
		}
		let result = sqlx::query(&statement.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;
		tracing::debug!(table = %table, rows = result.rows_affected(), "bulk inserted rows");
		Ok(result.rows_affected())
	}

	/// Refuses bulk insertion on cascade-managed tables.
	///
	/// A multi-row insert does not report the primary keys of the rows it
	/// created, so the dependent rows that creation must cascade into could
	/// never be attached. Translations are the terminal table of the chain
	/// and are exempt. [`TranslationStore::bulk_insert`] consults this
	/// before every write; it is also the escape hatch for callers that
	/// build their own statements against [`TranslationStore::pool`].
	pub fn check_bulk_insert(table: &str) -> Result<(), TranslationError> {
		match table {
			FIELDS_TABLE | ITEMS_TABLE | LANGUAGES_TABLE => {
				Err(TranslationError::BulkCreateUnsupported {
					table: table.to_string(),
				})
			}
			_ => Ok(()),
		}
	}

	// ------------------------------------------------------------------
	// Internals
	// ------------------------------------------------------------------

	async fn enumerate_objects(
		&self,
		entry: &RegisteredModel,
	) -> Result<Vec<i64>, TranslationError> {
		let statement = SeaQuery::select()
			.column(Alias::new(entry.pk_column))
			.from(Alias::new(entry.table_name))
			.to_owned();
		let rows = sqlx::query(&statement.to_string(SqliteQueryBuilder))
			.fetch_all(&*self.pool)
			.await?;
		rows.iter()
			.map(|row| row.try_get::<i64, _>(0).map_err(TranslationError::from))
			.collect()
	}

	async fn insert_item(
		&self,
		field_id: i64,
		object_id: i64,
		content_type_id: i64,
	) -> Result<Item, TranslationError> {
		let statement = SeaQuery::insert()
			.into_table(Alias::new(ITEMS_TABLE))
			.columns([
				Alias::new("field_id"),
				Alias::new("object_id"),
				Alias::new("content_type_id"),
			])
			.values([field_id.into(), object_id.into(), content_type_id.into()])
			.expect("column and value arity match")
			.to_owned();
		sqlx::query(&statement.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;
		self.items()
			.filter_field(field_id)
			.filter_object(object_id)
			.get()
			.await
	}

	async fn insert_translation(
		&self,
		language_id: i64,
		item_id: i64,
	) -> Result<(), TranslationError> {
		let statement = SeaQuery::insert()
			.into_table(Alias::new(TRANSLATIONS_TABLE))
			.columns([
				Alias::new("language_id"),
				Alias::new("item_id"),
				Alias::new("text"),
			])
			.values([language_id.into(), item_id.into(), String::new().into()])
			.expect("column and value arity match")
			.to_owned();
		sqlx::query(&statement.to_string(SqliteQueryBuilder))
			.execute(&*self.pool)
			.await?;
		Ok(())
	}
}
