//! Polymorphic model descriptors and the translatable-model registry
//!
//! A [`ContentType`] identifies one application model as an
//! `(app_label, model)` pair, persisted in the `content_types` table so that
//! side-table rows can reference arbitrary models. The
//! [`ContentTypeRegistry`] keeps the in-process half of that information:
//! which Rust types are translatable, and which table holds their rows so
//! cascade reactions can enumerate existing instances.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A polymorphic descriptor for one application model.
///
/// `id` is `None` until the descriptor has been persisted; rows loaded from
/// the database always carry their primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
	pub id: Option<i64>,
	pub app_label: String,
	pub model: String,
}

impl ContentType {
	pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> Self {
		Self {
			id: None,
			app_label: app_label.into(),
			model: model.into(),
		}
	}

	/// Returns the natural key (`app_label.model`)
	pub fn natural_key(&self) -> String {
		format!("{}.{}", self.app_label, self.model)
	}
}

impl std::fmt::Display for ContentType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}", self.app_label, self.model)
	}
}

/// A model type whose fields can be marked translatable.
///
/// Implementations supply the polymorphic identity of the type plus enough
/// table metadata for the store to enumerate existing rows when a new
/// translatable field is declared.
///
/// # Example
///
/// ```rust
/// use datatrans::contenttypes::{ContentType, Translatable};
///
/// struct Article {
///     id: i64,
///     title: String,
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
/// ```
pub trait Translatable {
	/// Polymorphic descriptor for this model type
	fn content_type() -> ContentType;

	/// Table holding the model's rows, used to enumerate existing instances
	fn table_name() -> &'static str;

	/// Primary-key column of [`Translatable::table_name`]
	fn pk_column() -> &'static str {
		"id"
	}

	/// Primary key of this instance
	fn object_id(&self) -> i64;
}

/// Registry entry for one translatable model type
#[derive(Debug, Clone)]
pub struct RegisteredModel {
	pub app_label: String,
	pub model: String,
	pub table_name: &'static str,
	pub pk_column: &'static str,
}

impl RegisteredModel {
	pub fn natural_key(&self) -> String {
		format!("{}.{}", self.app_label, self.model)
	}
}

/// In-process registry of translatable model types.
///
/// Registration records the owning table and primary-key column per
/// descriptor; the store consults the registry before creating a
/// translatable field so it can back-fill one item per existing row.
#[derive(Debug, Default)]
pub struct ContentTypeRegistry {
	entries: RwLock<HashMap<(String, String), RegisteredModel>>,
}

impl ContentTypeRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a model type. Re-registering the same type replaces the
	/// previous entry.
	pub fn register<T: Translatable>(&self) {
		let ct = T::content_type();
		let entry = RegisteredModel {
			app_label: ct.app_label.clone(),
			model: ct.model.clone(),
			table_name: T::table_name(),
			pk_column: T::pk_column(),
		};
		self.entries
			.write()
			.insert((ct.app_label, ct.model), entry);
	}

	/// Look up the entry for an `(app_label, model)` pair
	pub fn get(&self, app_label: &str, model: &str) -> Option<RegisteredModel> {
		self.entries
			.read()
			.get(&(app_label.to_string(), model.to_string()))
			.cloned()
	}

	pub fn contains(&self, app_label: &str, model: &str) -> bool {
		self.entries
			.read()
			.contains_key(&(app_label.to_string(), model.to_string()))
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	/// Natural keys of every registered type, sorted
	pub fn natural_keys(&self) -> Vec<String> {
		let mut keys: Vec<String> = self
			.entries
			.read()
			.values()
			.map(RegisteredModel::natural_key)
			.collect();
		keys.sort();
		keys
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Article {
		id: i64,
	}

	impl Translatable for Article {
		fn content_type() -> ContentType {
			ContentType::new("blog", "article")
		}
		fn table_name() -> &'static str {
			"blog_articles"
		}
		fn object_id(&self) -> i64 {
			self.id
		}
	}

	#[test]
	fn natural_key_joins_app_and_model() {
		let ct = ContentType::new("blog", "article");
		assert_eq!(ct.natural_key(), "blog.article");
		assert_eq!(ct.to_string(), "blog.article");
		assert_eq!(ct.id, None);
	}

	#[test]
	fn register_and_lookup() {
		let registry = ContentTypeRegistry::new();
		assert!(registry.is_empty());

		registry.register::<Article>();
		assert_eq!(registry.len(), 1);
		assert!(registry.contains("blog", "article"));

		let entry = registry.get("blog", "article").unwrap();
		assert_eq!(entry.table_name, "blog_articles");
		assert_eq!(entry.pk_column, "id");
		assert_eq!(entry.natural_key(), "blog.article");

		assert!(registry.get("blog", "comment").is_none());
	}

	#[test]
	fn reregistering_replaces_entry() {
		let registry = ContentTypeRegistry::new();
		registry.register::<Article>();
		registry.register::<Article>();
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn object_id_comes_from_instance() {
		let article = Article { id: 42 };
		assert_eq!(article.object_id(), 42);
	}
}
