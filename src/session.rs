//! Session-backed language selection
//!
//! The session is a plain JSON map, the shape session backends hand
//! around; any real backend can load one, let these helpers read or write
//! the language selection, and persist it again. The selection is stored
//! as the language's locale identifier under [`LANGUAGE_SESSION_KEY`], so
//! one value drives both presentation-layer and database-layer
//! translation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::TranslationError;
use crate::locale;
use crate::models::Language;
use crate::store::TranslationStore;
use crate::translatable::LanguageSelector;

/// Session key holding the selected locale identifier
pub const LANGUAGE_SESSION_KEY: &str = "_language";

/// A session's key/value payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData {
	values: HashMap<String, Value>,
}

impl SessionData {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	pub fn insert(&mut self, key: impl Into<String>, value: Value) {
		self.values.insert(key.into(), value);
	}

	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.values.remove(key)
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

/// The Language selected in a session, if any.
///
/// Returns `None` when the session holds no selection, when the stored
/// value is not a string, or when no Language row matches it anymore.
pub async fn language_from_session(
	store: &TranslationStore,
	session: &SessionData,
) -> Result<Option<Language>, TranslationError> {
	let Some(value) = session.get(LANGUAGE_SESSION_KEY) else {
		return Ok(None);
	};
	let Some(locale) = value.as_str() else {
		return Ok(None);
	};
	store.languages().filter_locale(locale).first().await
}

/// Switch the session (and the process locale) to a language.
///
/// Resolves the selector, activates the language's locale and persists the
/// selection under [`LANGUAGE_SESSION_KEY`]. Returns the resolved Language.
pub async fn update_session_language(
	store: &TranslationStore,
	session: &mut SessionData,
	language: LanguageSelector<'_>,
) -> Result<Language, TranslationError> {
	let language = language.resolve(store).await?;
	locale::activate(&language.locale);
	session.insert(LANGUAGE_SESSION_KEY, Value::String(language.locale.clone()));
	Ok(language)
}
