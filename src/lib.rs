//! # datatrans
//!
//! Database-level content translation for Rust web services.
//!
//! Application models mark individual fields as translatable; the text for
//! every supported language lives in four side tables (fields, items,
//! languages, translations) instead of in the owning row. The crate
//! provides the schema, the cascade reactions that keep the side tables
//! complete, traversal helpers from any owning instance to its
//! translations, and a generic serializer that substitutes translated text
//! into an attribute map.
//!
//! ## How the tables relate
//!
//! - A [`models::Field`] marks one attribute of one model as translatable.
//! - Creating a Field back-fills one [`models::Item`] per existing
//!   instance, and one empty [`models::Translation`] per Item and
//!   [`models::Language`].
//! - Reads go Item → Translation filtered by Language; writes update
//!   `Translation.text` directly.
//!
//! Item and Translation rows are never created by hand: they exist only as
//! cascade reactions driven by [`store::TranslationStore`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use datatrans::contenttypes::{ContentType, ContentTypeRegistry, Translatable};
//! use datatrans::schema::SqlBackend;
//! use datatrans::store::TranslationStore;
//! use datatrans::translatable::TranslatedModel;
//! use std::sync::Arc;
//!
//! struct Article {
//!     id: i64,
//! }
//!
//! impl Translatable for Article {
//!     fn content_type() -> ContentType {
//!         ContentType::new("blog", "article")
//!     }
//!     fn table_name() -> &'static str {
//!         "blog_articles"
//!     }
//!     fn object_id(&self) -> i64 {
//!         self.id
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! sqlx::any::install_default_drivers();
//! let pool = Arc::new(sqlx::AnyPool::connect("sqlite::memory:").await?);
//! let registry = Arc::new(ContentTypeRegistry::new());
//! registry.register::<Article>();
//!
//! let store = TranslationStore::new(pool, registry);
//! store.ensure_schema(SqlBackend::Sqlite).await?;
//!
//! let french = store.create_language("French", "fr", "fra", "fr-FR").await?;
//! store.create_field_for::<Article>("title").await?;
//!
//! let article = Article { id: 1 };
//! let translation = article.translation(&store, "title".into(), (&french).into()).await?;
//! println!("title in {}: {}", french, translation.text);
//! # Ok(())
//! # }
//! ```

pub mod contenttypes;
pub mod error;
pub mod locale;
pub mod models;
pub mod query;
pub mod schema;
pub mod serializer;
pub mod session;
pub mod store;
pub mod translatable;

pub use contenttypes::{ContentType, ContentTypeRegistry, RegisteredModel, Translatable};
pub use error::TranslationError;
pub use models::{Field, Item, Language, Translation};
pub use query::{FieldQuery, ItemQuery, LanguageQuery, TranslationQuery};
pub use schema::SqlBackend;
pub use serializer::{
	AttrValue, FileRef, SerializeOptions, TranslatedSerialize, instance_as_translated_dict,
	instances_as_translated_dicts,
};
pub use session::{
	LANGUAGE_SESSION_KEY, SessionData, language_from_session, update_session_language,
};
pub use store::TranslationStore;
pub use translatable::{FieldSelector, LanguageSelector, TranslatedModel};
