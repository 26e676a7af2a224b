//! Lookup mixin for translatable entities
//!
//! [`TranslatedModel`] is implemented for every [`Translatable`] type and
//! walks the side tables from the instance outward: Field rows for the
//! type, Item rows for the instance, Translation rows per language, and a
//! full attribute map with translated text substituted in.
//!
//! Field and language arguments are [`FieldSelector`] / [`LanguageSelector`]
//! values, so callers can hand over either a row they already hold or the
//! identifier they have; an already-resolved row always wins over a fresh
//! lookup.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::contenttypes::{ContentType, Translatable};
use crate::error::TranslationError;
use crate::models::{Field, Item, Language, Translation};
use crate::store::TranslationStore;

/// A translatable field, either as a loaded row or by name
#[derive(Debug, Clone, Copy)]
pub enum FieldSelector<'a> {
	Instance(&'a Field),
	Name(&'a str),
}

impl<'a> From<&'a Field> for FieldSelector<'a> {
	fn from(field: &'a Field) -> Self {
		Self::Instance(field)
	}
}

impl<'a> From<&'a str> for FieldSelector<'a> {
	fn from(name: &'a str) -> Self {
		Self::Name(name)
	}
}

impl FieldSelector<'_> {
	pub(crate) async fn resolve(
		&self,
		store: &TranslationStore,
		content_type_id: i64,
	) -> Result<Field, TranslationError> {
		match self {
			Self::Instance(field) => Ok((*field).clone()),
			Self::Name(name) => {
				store
					.fields()
					.filter_content_type(content_type_id)
					.filter_name(*name)
					.get()
					.await
			}
		}
	}
}

/// A language, either as a loaded row or by database id
#[derive(Debug, Clone, Copy)]
pub enum LanguageSelector<'a> {
	Instance(&'a Language),
	Id(i64),
}

impl<'a> From<&'a Language> for LanguageSelector<'a> {
	fn from(language: &'a Language) -> Self {
		Self::Instance(language)
	}
}

impl From<i64> for LanguageSelector<'_> {
	fn from(id: i64) -> Self {
		Self::Id(id)
	}
}

impl LanguageSelector<'_> {
	pub(crate) async fn resolve(
		&self,
		store: &TranslationStore,
	) -> Result<Language, TranslationError> {
		match self {
			Self::Instance(language) => Ok((*language).clone()),
			Self::Id(id) => store.languages().filter_id(*id).get().await,
		}
	}
}

/// Traversal helpers from a translatable instance into the side tables.
///
/// Blanket-implemented for every `Translatable` type; all lookups are
/// strict and surface typed not-found errors.
#[async_trait]
pub trait TranslatedModel: Translatable + Sync + Sized {
	/// The persisted content type row for this model type
	async fn persisted_content_type(
		&self,
		store: &TranslationStore,
	) -> Result<ContentType, TranslationError> {
		store.content_type_of::<Self>().await
	}

	/// The Field row named `name` for this model type
	async fn translated_field(
		&self,
		store: &TranslationStore,
		name: &str,
	) -> Result<Field, TranslationError> {
		let content_type = store.content_type_of::<Self>().await?;
		store
			.fields()
			.filter_content_type(crate::store::require_id(&content_type)?)
			.filter_name(name)
			.get()
			.await
	}

	/// All Field rows for this model type
	async fn translated_fields(
		&self,
		store: &TranslationStore,
	) -> Result<Vec<Field>, TranslationError> {
		let content_type = store.content_type_of::<Self>().await?;
		store
			.fields()
			.filter_content_type(crate::store::require_id(&content_type)?)
			.all()
			.await
	}

	/// The Item row of this instance for one field
	async fn translated_item(
		&self,
		store: &TranslationStore,
		field: FieldSelector<'_>,
	) -> Result<Item, TranslationError> {
		let content_type = store.content_type_of::<Self>().await?;
		let field = field
			.resolve(store, crate::store::require_id(&content_type)?)
			.await?;
		store
			.items()
			.filter_field(field.id)
			.filter_object(self.object_id())
			.get()
			.await
	}

	/// All Item rows of this instance
	async fn translated_items(
		&self,
		store: &TranslationStore,
	) -> Result<Vec<Item>, TranslationError> {
		let fields = self.translated_fields(store).await?;
		let field_ids: Vec<i64> = fields.iter().map(|field| field.id).collect();
		if field_ids.is_empty() {
			return Ok(Vec::new());
		}
		store
			.items()
			.filter_object(self.object_id())
			.filter_field_in(field_ids)
			.all()
			.await
	}

	/// The Translation of one field of this instance in one language
	async fn translation(
		&self,
		store: &TranslationStore,
		field: FieldSelector<'_>,
		language: LanguageSelector<'_>,
	) -> Result<Translation, TranslationError> {
		let item = self.translated_item(store, field).await?;
		let language = language.resolve(store).await?;
		store
			.translations()
			.filter_item(item.id)
			.filter_language(language.id)
			.get()
			.await
	}

	/// All Translations of this instance in one language
	async fn translations(
		&self,
		store: &TranslationStore,
		language: LanguageSelector<'_>,
	) -> Result<Vec<Translation>, TranslationError> {
		let items = self.translated_items(store).await?;
		let item_ids: Vec<i64> = items.iter().map(|item| item.id).collect();
		if item_ids.is_empty() {
			return Ok(Vec::new());
		}
		let language = language.resolve(store).await?;
		store
			.translations()
			.filter_item_in(item_ids)
			.filter_language(language.id)
			.all()
			.await
	}

	/// All Translations of this instance across every language
	async fn translations_all_languages(
		&self,
		store: &TranslationStore,
	) -> Result<Vec<Translation>, TranslationError> {
		let items = self.translated_items(store).await?;
		let item_ids: Vec<i64> = items.iter().map(|item| item.id).collect();
		if item_ids.is_empty() {
			return Ok(Vec::new());
		}
		store.translations().filter_item_in(item_ids).all().await
	}

	/// The instance's attributes as a map, with each translatable field's
	/// text substituted in under the field's name
	async fn dict_with_translations(
		&self,
		store: &TranslationStore,
		language: LanguageSelector<'_>,
	) -> Result<Map<String, Value>, TranslationError>
	where
		Self: Serialize,
	{
		let value = serde_json::to_value(self)
			.map_err(|error| TranslationError::Serialization(error.to_string()))?;
		let Value::Object(mut map) = value else {
			return Err(TranslationError::Serialization(
				"instance did not serialize to an object".to_string(),
			));
		};
		let language = language.resolve(store).await?;
		for field in self.translated_fields(store).await? {
			let translation = self
				.translation(
					store,
					FieldSelector::Instance(&field),
					LanguageSelector::Instance(&language),
				)
				.await?;
			map.insert(field.name.clone(), Value::String(translation.text));
		}
		Ok(map)
	}
}

impl<T: Translatable + Sync + Sized> TranslatedModel for T {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn selectors_convert_from_rows_and_identifiers() {
		let field = Field {
			id: 3,
			content_type_id: 1,
			name: "title".to_string(),
		};
		assert!(matches!(
			FieldSelector::from(&field),
			FieldSelector::Instance(_)
		));
		assert!(matches!(FieldSelector::from("title"), FieldSelector::Name("title")));

		let language = Language {
			id: 5,
			name: "French".to_string(),
			iso2: "FR".to_string(),
			iso3: "FRA".to_string(),
			locale: "fr-FR".to_string(),
		};
		assert!(matches!(
			LanguageSelector::from(&language),
			LanguageSelector::Instance(_)
		));
		assert!(matches!(LanguageSelector::from(5), LanguageSelector::Id(5)));
	}
}
