//! DDL for the translation side tables
//!
//! The table layout is the externally meaningful interface of this crate
//! and is kept identical across backends: only the auto-increment primary
//! key spelling differs between SQLite and PostgreSQL.

use crate::error::TranslationError;
use sqlx::AnyPool;

/// Backend dialect for schema statements.
///
/// Detected from the connection URL, the same way the persistence layer it
/// is modeled on receives its URL alongside the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlBackend {
	Sqlite,
	Postgres,
}

impl SqlBackend {
	pub fn from_url(url: &str) -> Self {
		if url.starts_with("postgres") {
			Self::Postgres
		} else {
			Self::Sqlite
		}
	}

	fn auto_pk(self) -> &'static str {
		match self {
			Self::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
			Self::Postgres => "BIGSERIAL PRIMARY KEY",
		}
	}
}

fn create_statements(backend: SqlBackend) -> Vec<String> {
	let pk = backend.auto_pk();
	vec![
		format!(
			r#"
			CREATE TABLE IF NOT EXISTS content_types (
				id {pk},
				app_label VARCHAR(100) NOT NULL,
				model VARCHAR(100) NOT NULL,
				UNIQUE(app_label, model)
			)
			"#
		),
		format!(
			r#"
			CREATE TABLE IF NOT EXISTS ddt_fields (
				id {pk},
				content_type_id BIGINT NOT NULL REFERENCES content_types(id) ON DELETE CASCADE,
				name VARCHAR(100) NOT NULL,
				UNIQUE(content_type_id, name)
			)
			"#
		),
		format!(
			r#"
			CREATE TABLE IF NOT EXISTS ddt_items (
				id {pk},
				field_id BIGINT NOT NULL REFERENCES ddt_fields(id) ON DELETE CASCADE,
				object_id BIGINT NOT NULL,
				content_type_id BIGINT NOT NULL REFERENCES content_types(id) ON DELETE CASCADE,
				UNIQUE(field_id, object_id)
			)
			"#
		),
		"CREATE INDEX IF NOT EXISTS idx_items_object ON ddt_items(object_id)".to_string(),
		format!(
			r#"
			CREATE TABLE IF NOT EXISTS ddt_languages (
				id {pk},
				name VARCHAR(100) NOT NULL UNIQUE,
				iso2 VARCHAR(2) NOT NULL UNIQUE,
				iso3 VARCHAR(3) NOT NULL UNIQUE,
				locale VARCHAR(5) NOT NULL UNIQUE
			)
			"#
		),
		format!(
			r#"
			CREATE TABLE IF NOT EXISTS ddt_translations (
				id {pk},
				language_id BIGINT NOT NULL REFERENCES ddt_languages(id) ON DELETE CASCADE,
				item_id BIGINT NOT NULL REFERENCES ddt_items(id) ON DELETE CASCADE,
				text TEXT NOT NULL DEFAULT '',
				UNIQUE(language_id, item_id)
			)
			"#
		),
		"CREATE INDEX IF NOT EXISTS idx_item_lang ON ddt_translations(item_id, language_id)"
			.to_string(),
	]
}

/// Create the content-type table and the four side tables.
///
/// Idempotent: every statement is `IF NOT EXISTS`.
pub async fn create_tables(pool: &AnyPool, backend: SqlBackend) -> Result<(), TranslationError> {
	for statement in create_statements(backend) {
		sqlx::query(&statement).execute(pool).await?;
	}
	Ok(())
}

/// Drop the side tables and the content-type table, dependents first
pub async fn drop_tables(pool: &AnyPool) -> Result<(), TranslationError> {
	for table in [
		"ddt_translations",
		"ddt_items",
		"ddt_fields",
		"ddt_languages",
		"content_types",
	] {
		sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
			.execute(pool)
			.await?;
	}
	Ok(())
}
