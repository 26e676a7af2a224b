//! Row types for the translation side tables
//!
//! Four tables carry the translated content:
//!
//! - `ddt_fields`: which attribute of which model is translatable
//! - `ddt_items`: one row per concrete instance of a translatable attribute
//! - `ddt_languages`: the supported locales
//! - `ddt_translations`: the text of one item in one language
//!
//! Field and Language rows are inserted by an administrator; Item and
//! Translation rows exist only as cascade reactions to those inserts and to
//! owning-object lifecycle events.

use crate::contenttypes::ContentType;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::any::AnyRow;

pub const CONTENT_TYPES_TABLE: &str = "content_types";
pub const FIELDS_TABLE: &str = "ddt_fields";
pub const ITEMS_TABLE: &str = "ddt_items";
pub const LANGUAGES_TABLE: &str = "ddt_languages";
pub const TRANSLATIONS_TABLE: &str = "ddt_translations";

/// One translatable attribute of one application model.
///
/// `(content_type_id, name)` is unique; deleting a field deletes all of its
/// items and their translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
	pub id: i64,
	pub content_type_id: i64,
	pub name: String,
}

impl Field {
	pub(crate) fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
		Ok(Self {
			id: row.try_get("id")?,
			content_type_id: row.try_get("content_type_id")?,
			name: row.try_get("name")?,
		})
	}

	/// Returns `app_label.model.name` for the owning content type
	pub fn qualified_name(&self, content_type: &ContentType) -> String {
		format!(
			"{}.{}.{}",
			content_type.app_label, content_type.model, self.name
		)
	}
}

/// One concrete instance's translatable attribute.
///
/// `(field_id, object_id)` is unique; the `(content_type_id, object_id)`
/// pair resolves the owning object polymorphically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
	pub id: i64,
	pub field_id: i64,
	pub object_id: i64,
	pub content_type_id: i64,
}

impl Item {
	pub(crate) fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
		Ok(Self {
			id: row.try_get("id")?,
			field_id: row.try_get("field_id")?,
			object_id: row.try_get("object_id")?,
			content_type_id: row.try_get("content_type_id")?,
		})
	}

	/// Returns `app_label.model.field.object_id`
	pub fn qualified_name(&self, content_type: &ContentType, field: &Field) -> String {
		format!("{}.{}", field.qualified_name(content_type), self.object_id)
	}
}

/// A supported locale.
///
/// `iso2` and `iso3` are stored uppercase regardless of input case; `locale`
/// matches the host framework's locale setting (for example `fr-FR`), so a
/// single selection drives both presentation-layer and database-layer
/// translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
	pub id: i64,
	pub name: String,
	pub iso2: String,
	pub iso3: String,
	pub locale: String,
}

impl Language {
	pub(crate) fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
		Ok(Self {
			id: row.try_get("id")?,
			name: row.try_get("name")?,
			iso2: row.try_get("iso2")?,
			iso3: row.try_get("iso3")?,
			locale: row.try_get("locale")?,
		})
	}
}

impl std::fmt::Display for Language {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.name)
	}
}

/// Uppercases an ISO language code for storage
pub(crate) fn normalize_iso(code: &str) -> String {
	code.trim().to_uppercase()
}

/// The text of one item in one language.
///
/// `(language_id, item_id)` is unique and indexed for lookup. `text`
/// defaults to the empty string and is never null; an empty text is a
/// missing translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
	pub id: i64,
	pub language_id: i64,
	pub item_id: i64,
	pub text: String,
}

impl Translation {
	pub(crate) fn from_row(row: &AnyRow) -> Result<Self, sqlx::Error> {
		Ok(Self {
			id: row.try_get("id")?,
			language_id: row.try_get("language_id")?,
			item_id: row.try_get("item_id")?,
			text: row.try_get("text")?,
		})
	}

	/// Returns `app_label.model.field.object_id (language name)`
	pub fn describe(
		&self,
		item: &Item,
		content_type: &ContentType,
		field: &Field,
		language: &Language,
	) -> String {
		format!("{} ({})", item.qualified_name(content_type, field), language)
	}

	/// Whether the translation is still waiting for text
	pub fn is_missing(&self) -> bool {
		self.text.is_empty()
	}

	/// First 20 characters of the text, for listings
	pub fn truncated_text(&self) -> String {
		self.text.chars().take(20).collect()
	}
}
