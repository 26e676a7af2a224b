//! Error types for translation lookups and cascade operations

use thiserror::Error;

/// Errors surfaced by translation lookups, cascade reactions and the
/// generic serializer.
///
/// Every failure is synchronous: either a row the caller asked for does not
/// exist, a required argument is missing, or the database itself refused the
/// statement. There is no retry or recovery layer on top.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TranslationError {
	/// No content type row matches the requested descriptor
	#[error("content type not found: {0}")]
	ContentTypeNotFound(String),

	/// No translatable field row matches the lookup
	#[error("translatable field not found: {0}")]
	FieldNotFound(String),

	/// No item row matches the lookup
	#[error("translated item not found: {0}")]
	ItemNotFound(String),

	/// No language row matches the lookup
	#[error("language not found: {0}")]
	LanguageNotFound(String),

	/// No translation row matches the lookup
	#[error("translation not found: {0}")]
	TranslationNotFound(String),

	/// The model type was never registered with the content type registry,
	/// so its existing rows cannot be enumerated for the cascade
	#[error("model {app_label}.{model} is not registered for translation")]
	UnregisteredModel { app_label: String, model: String },

	/// Neither a language nor a session context was supplied where one of
	/// the two is required
	#[error("either a language or a session with a language selection is required")]
	MissingLanguage,

	/// Bulk insertion was attempted on a cascade-managed table. Bulk
	/// inserts do not report primary keys, so the dependent rows created on
	/// insert could never be attached.
	#[error("bulk insert is not allowed on {table}: rows on this table cascade into dependent rows on creation")]
	BulkCreateUnsupported { table: String },

	/// A bulk-insert row does not line up with the supplied column list
	#[error("bulk insert row does not match the column list: expected {expected} values, got {got}")]
	BulkRowMismatch { expected: usize, got: usize },

	/// An instance could not be converted to an attribute map
	#[error("serialization failed: {0}")]
	Serialization(String),

	/// Underlying database failure
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}
