//! Generic entity-to-map serializer with translation substitution
//!
//! Converts any entity that can walk its own attributes into a plain
//! `serde_json::Map`, ready for templating or an API response:
//!
//! - an Item reference becomes the translated text for the resolved
//!   language;
//! - a nested entity is serialized recursively, or collapsed to its
//!   primary key when depth-limiting is requested;
//! - a file reference is flattened to `{name, url, path}` (an unset file
//!   becomes the empty string);
//! - every other value passes through unchanged.
//!
//! The language must be resolvable: supplied directly, or found in a
//! session context. Supplying neither is an error, never a silent default.

use serde_json::{Map, Value, json};
use std::future::Future;
use std::pin::Pin;

use crate::error::TranslationError;
use crate::models::Language;
use crate::session::{SessionData, language_from_session};
use crate::store::TranslationStore;

/// A stored file attribute, flattened to its three addressable parts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRef {
	pub name: String,
	pub url: String,
	pub path: String,
}

impl FileRef {
	pub fn new(
		name: impl Into<String>,
		url: impl Into<String>,
		path: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			url: url.into(),
			path: path.into(),
		}
	}

	/// A file slot with nothing uploaded
	pub fn is_empty(&self) -> bool {
		self.name.is_empty()
	}
}

/// One attribute value as seen by the serializer
pub enum AttrValue<'a> {
	/// Reference to a translatable item, by Item id
	Item(i64),
	/// Reference to another serializable entity
	Entity(&'a dyn TranslatedSerialize),
	/// A file or image attribute
	File(&'a FileRef),
	/// Any other value, passed through unchanged
	Raw(Value),
}

/// An entity the generic serializer can walk.
///
/// `attributes` declares every attribute with its serializer-relevant
/// shape; `primary_key` is what a depth-limited serialization emits
/// instead of recursing into the entity.
pub trait TranslatedSerialize: Send + Sync {
	fn attributes(&self) -> Vec<(String, AttrValue<'_>)>;

	fn primary_key(&self) -> Value {
		Value::Null
	}
}

/// Options for one serialization call.
///
/// `depth` is on by default: nested entities are recursed into. Exactly
/// one language source must be present for the call to succeed.
#[derive(Clone, Copy)]
pub struct SerializeOptions<'a> {
	pub depth: bool,
	pub language: Option<&'a Language>,
	pub session: Option<&'a SessionData>,
}

impl<'a> SerializeOptions<'a> {
	pub fn with_language(language: &'a Language) -> Self {
		Self {
			depth: true,
			language: Some(language),
			session: None,
		}
	}

	pub fn with_session(session: &'a SessionData) -> Self {
		Self {
			depth: true,
			language: None,
			session: Some(session),
		}
	}

	/// Do not recurse into nested entities
	pub fn shallow(mut self) -> Self {
		self.depth = false;
		self
	}
}

async fn resolve_language(
	store: &TranslationStore,
	options: &SerializeOptions<'_>,
) -> Result<Language, TranslationError> {
	if let Some(language) = options.language {
		return Ok(language.clone());
	}
	let Some(session) = options.session else {
		return Err(TranslationError::MissingLanguage);
	};
	language_from_session(store, session).await?.ok_or_else(|| {
		TranslationError::LanguageNotFound("session has no usable language selection".to_string())
	})
}

/// Serialize one entity to an attribute map with translations substituted
pub async fn instance_as_translated_dict(
	store: &TranslationStore,
	instance: &dyn TranslatedSerialize,
	options: &SerializeOptions<'_>,
) -> Result<Map<String, Value>, TranslationError> {
	let language = resolve_language(store, options).await?;
	serialize_entity(store, instance, options.depth, &language).await
}

/// [`instance_as_translated_dict`] over a slice of entities
pub async fn instances_as_translated_dicts(
	store: &TranslationStore,
	instances: &[&dyn TranslatedSerialize],
	options: &SerializeOptions<'_>,
) -> Result<Vec<Map<String, Value>>, TranslationError> {
	let language = resolve_language(store, options).await?;
	let mut results = Vec::with_capacity(instances.len());
	for instance in instances {
		results.push(serialize_entity(store, *instance, options.depth, &language).await?);
	}
	Ok(results)
}

// Boxed so the nested-entity case can recurse.
fn serialize_entity<'a>(
	store: &'a TranslationStore,
	instance: &'a dyn TranslatedSerialize,
	depth: bool,
	language: &'a Language,
) -> Pin<Box<dyn Future<Output = Result<Map<String, Value>, TranslationError>> + Send + 'a>> {
	Box::pin(async move {
		let mut map = Map::new();
		for (name, value) in instance.attributes() {
			let converted = match value {
				AttrValue::Item(item_id) => {
					let translation = store
						.translations()
						.filter_item(item_id)
						.filter_language(language.id)
						.get()
						.await?;
					Value::String(translation.text)
				}
				AttrValue::Entity(entity) => {
					if depth {
						Value::Object(serialize_entity(store, entity, true, language).await?)
					} else {
						entity.primary_key()
					}
				}
				AttrValue::File(file) => {
					if file.is_empty() {
						Value::String(String::new())
					} else {
						json!({
							"name": file.name,
							"url": file.url,
							"path": file.path,
						})
					}
				}
				AttrValue::Raw(value) => value,
			};
			map.insert(name, converted);
		}
		Ok(map)
	})
}
