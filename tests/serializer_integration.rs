//! Generic serializer and session-language integration tests

use serde_json::{Value, json};
use sqlx::AnyPool;
use sqlx::pool::PoolOptions;
use std::sync::{Arc, Once};

use datatrans::contenttypes::{ContentType, ContentTypeRegistry, Translatable};
use datatrans::error::TranslationError;
use datatrans::locale;
use datatrans::models::Field;
use datatrans::schema::{self, SqlBackend};
use datatrans::serializer::{
	AttrValue, FileRef, SerializeOptions, TranslatedSerialize, instance_as_translated_dict,
	instances_as_translated_dicts,
};
use datatrans::session::{LANGUAGE_SESSION_KEY, SessionData, language_from_session, update_session_language};
use datatrans::store::TranslationStore;
use serial_test::serial;

static INIT_DRIVERS: Once = Once::new();

fn init_drivers() {
	INIT_DRIVERS.call_once(|| {
		sqlx::any::install_default_drivers();
	});
}

struct Category {
	id: i64,
	name_item: i64,
	slug: String,
}

impl Translatable for Category {
	fn content_type() -> ContentType {
		ContentType::new("shop", "category")
	}
	fn table_name() -> &'static str {
		"shop_categories"
	}
	fn object_id(&self) -> i64 {
		self.id
	}
}

impl TranslatedSerialize for Category {
	fn attributes(&self) -> Vec<(String, AttrValue<'_>)> {
		vec![
			("id".to_string(), AttrValue::Raw(json!(self.id))),
			("name".to_string(), AttrValue::Item(self.name_item)),
			("slug".to_string(), AttrValue::Raw(json!(self.slug))),
		]
	}
	fn primary_key(&self) -> Value {
		json!(self.id)
	}
}

struct Product {
	id: i64,
	title_item: i64,
	photo: FileRef,
	category: Category,
}

impl Translatable for Product {
	fn content_type() -> ContentType {
		ContentType::new("shop", "product")
	}
	fn table_name() -> &'static str {
		"shop_products"
	}
	fn object_id(&self) -> i64 {
		self.id
	}
}

impl TranslatedSerialize for Product {
	fn attributes(&self) -> Vec<(String, AttrValue<'_>)> {
		vec![
			("id".to_string(), AttrValue::Raw(json!(self.id))),
			("title".to_string(), AttrValue::Item(self.title_item)),
			("photo".to_string(), AttrValue::File(&self.photo)),
			("category".to_string(), AttrValue::Entity(&self.category)),
		]
	}
	fn primary_key(&self) -> Value {
		json!(self.id)
	}
}

async fn setup_store() -> TranslationStore {
	init_drivers();
	let pool: AnyPool = PoolOptions::new()
		.min_connections(1)
		.max_connections(1)
		.connect("sqlite::memory:")
		.await
		.expect("Failed to connect");
	schema::create_tables(&pool, SqlBackend::Sqlite)
		.await
		.expect("Failed to create side tables");
	for statement in [
		"CREATE TABLE shop_products (id INTEGER PRIMARY KEY AUTOINCREMENT, sku VARCHAR(100) NOT NULL)",
		"CREATE TABLE shop_categories (id INTEGER PRIMARY KEY AUTOINCREMENT, slug VARCHAR(100) NOT NULL)",
		"INSERT INTO shop_products (sku) VALUES ('SKU-1')",
		"INSERT INTO shop_categories (slug) VALUES ('garden')",
	] {
		sqlx::query(statement)
			.execute(&pool)
			.await
			.expect("Failed to seed owning tables");
	}

	let registry = Arc::new(ContentTypeRegistry::new());
	registry.register::<Product>();
	registry.register::<Category>();
	TranslationStore::new(Arc::new(pool), registry)
}

/// Language, fields and texts, then the entity graph under test
async fn setup_product(store: &TranslationStore) -> (datatrans::models::Language, Product) {
	let french = store
		.create_language("French", "fr", "fra", "fr-FR")
		.await
		.expect("Failed to create language");
	let title = store
		.create_field_for::<Product>("title")
		.await
		.expect("Failed to create product field");
	let name = store
		.create_field_for::<Category>("name")
		.await
		.expect("Failed to create category field");

	let title_item = item_id_for(store, &title, 1).await;
	let name_item = item_id_for(store, &name, 1).await;

	for (item_id, text) in [(title_item, "Produit un"), (name_item, "Jardin")] {
		let translation = store
			.translations()
			.filter_item(item_id)
			.filter_language(french.id)
			.get()
			.await
			.expect("Back-filled translation exists");
		store
			.set_translation_text(&translation, text)
			.await
			.expect("Failed to set text");
	}

	let product = Product {
		id: 1,
		title_item,
		photo: FileRef::new("photo.jpg", "/media/photo.jpg", "/srv/media/photo.jpg"),
		category: Category {
			id: 1,
			name_item,
			slug: "garden".to_string(),
		},
	};
	(french, product)
}

async fn item_id_for(store: &TranslationStore, field: &Field, object_id: i64) -> i64 {
	store
		.items()
		.filter_field(field.id)
		.filter_object(object_id)
		.get()
		.await
		.expect("Back-filled item exists")
		.id
}

#[tokio::test]
async fn serializing_without_language_or_session_fails() {
	let store = setup_store().await;
	let (_, product) = setup_product(&store).await;

	let options = SerializeOptions {
		depth: true,
		language: None,
		session: None,
	};
	let err = instance_as_translated_dict(&store, &product, &options)
		.await
		.unwrap_err();
	assert!(matches!(err, TranslationError::MissingLanguage));

	let err = instances_as_translated_dicts(&store, &[&product], &options)
		.await
		.unwrap_err();
	assert!(matches!(err, TranslationError::MissingLanguage));
}

#[tokio::test]
async fn serializer_substitutes_translations_and_flattens_files() {
	let store = setup_store().await;
	let (french, product) = setup_product(&store).await;

	let dict = instance_as_translated_dict(
		&store,
		&product,
		&SerializeOptions::with_language(&french),
	)
	.await
	.expect("Failed to serialize");

	assert_eq!(dict["id"], json!(1));
	assert_eq!(dict["title"], json!("Produit un"));
	assert_eq!(dict["photo"]["name"], json!("photo.jpg"));
	assert_eq!(dict["photo"]["url"], json!("/media/photo.jpg"));
	assert_eq!(dict["photo"]["path"], json!("/srv/media/photo.jpg"));
	// Nested entity serialized in place, with its own translation
	assert_eq!(dict["category"]["name"], json!("Jardin"));
	assert_eq!(dict["category"]["slug"], json!("garden"));
}

#[tokio::test]
async fn shallow_serialization_collapses_nested_entities() {
	let store = setup_store().await;
	let (french, product) = setup_product(&store).await;

	let dict = instance_as_translated_dict(
		&store,
		&product,
		&SerializeOptions::with_language(&french).shallow(),
	)
	.await
	.unwrap();

	assert_eq!(dict["category"], json!(product.category.id));
	// Translation substitution still happens at the top level
	assert_eq!(dict["title"], json!("Produit un"));
}

#[tokio::test]
async fn empty_file_serializes_as_empty_string() {
	let store = setup_store().await;
	let (french, mut product) = setup_product(&store).await;
	product.photo = FileRef::default();

	let dict = instance_as_translated_dict(
		&store,
		&product,
		&SerializeOptions::with_language(&french),
	)
	.await
	.unwrap();

	assert_eq!(dict["photo"], json!(""));
}

#[tokio::test]
async fn missing_translation_serializes_as_empty_text() {
	let store = setup_store().await;
	let french = store
		.create_language("French", "fr", "fra", "fr-FR")
		.await
		.unwrap();
	let title = store.create_field_for::<Product>("title").await.unwrap();
	let name = store.create_field_for::<Category>("name").await.unwrap();

	let product = Product {
		id: 1,
		title_item: item_id_for(&store, &title, 1).await,
		photo: FileRef::default(),
		category: Category {
			id: 1,
			name_item: item_id_for(&store, &name, 1).await,
			slug: "garden".to_string(),
		},
	};

	let dict = instance_as_translated_dict(
		&store,
		&product,
		&SerializeOptions::with_language(&french),
	)
	.await
	.unwrap();

	assert_eq!(dict["title"], json!(""));
}

#[tokio::test]
async fn serializer_maps_over_many_instances() {
	let store = setup_store().await;
	let (french, product) = setup_product(&store).await;

	let dicts = instances_as_translated_dicts(
		&store,
		&[&product, &product.category],
		&SerializeOptions::with_language(&french),
	)
	.await
	.unwrap();

	assert_eq!(dicts.len(), 2);
	assert_eq!(dicts[0]["title"], json!("Produit un"));
	assert_eq!(dicts[1]["name"], json!("Jardin"));
}

#[tokio::test]
#[serial]
async fn updating_the_session_language_activates_the_locale() {
	let store = setup_store().await;
	let (french, _) = setup_product(&store).await;
	locale::deactivate();

	let mut session = SessionData::new();
	let resolved = update_session_language(&store, &mut session, (&french).into())
		.await
		.expect("Failed to update session language");

	assert_eq!(resolved.id, french.id);
	assert_eq!(locale::active_locale().as_deref(), Some("fr-FR"));
	assert_eq!(session.get(LANGUAGE_SESSION_KEY), Some(&json!("fr-FR")));

	let from_session = language_from_session(&store, &session)
		.await
		.unwrap()
		.expect("Session resolves to a language");
	assert_eq!(from_session.id, french.id);
}

#[tokio::test]
#[serial]
async fn updating_by_language_id_resolves_the_row() {
	let store = setup_store().await;
	let (french, _) = setup_product(&store).await;

	let mut session = SessionData::new();
	let resolved = update_session_language(&store, &mut session, french.id.into())
		.await
		.unwrap();
	assert_eq!(resolved.locale, "fr-FR");

	let err = update_session_language(&store, &mut session, 999_i64.into())
		.await
		.unwrap_err();
	assert!(matches!(err, TranslationError::LanguageNotFound(_)));
}

#[tokio::test]
#[serial]
async fn serializer_resolves_language_from_the_session() {
	let store = setup_store().await;
	let (french, product) = setup_product(&store).await;

	let mut session = SessionData::new();
	update_session_language(&store, &mut session, (&french).into())
		.await
		.unwrap();

	let dict = instance_as_translated_dict(
		&store,
		&product,
		&SerializeOptions::with_session(&session),
	)
	.await
	.expect("Failed to serialize from session");
	assert_eq!(dict["title"], json!("Produit un"));
}

#[tokio::test]
async fn session_without_a_usable_selection_is_an_error() {
	let store = setup_store().await;
	let (_, product) = setup_product(&store).await;

	// No selection at all
	let empty = SessionData::new();
	let err = instance_as_translated_dict(
		&store,
		&product,
		&SerializeOptions::with_session(&empty),
	)
	.await
	.unwrap_err();
	assert!(matches!(err, TranslationError::LanguageNotFound(_)));

	// A selection that no longer resolves to a row
	let mut stale = SessionData::new();
	stale.insert(LANGUAGE_SESSION_KEY, json!("xx-XX"));
	assert!(language_from_session(&store, &stale).await.unwrap().is_none());
	let err = instance_as_translated_dict(
		&store,
		&product,
		&SerializeOptions::with_session(&stale),
	)
	.await
	.unwrap_err();
	assert!(matches!(err, TranslationError::LanguageNotFound(_)));
}
