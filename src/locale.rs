//! Process-wide active locale
//!
//! The presentation layer and the database layer share one locale
//! selection: [`activate`] records it, [`active_locale`] reads it back.
//! The session helpers call [`activate`] whenever a user switches
//! language so both layers stay consistent.

use once_cell::sync::Lazy;
use parking_lot::RwLock;

static ACTIVE_LOCALE: Lazy<RwLock<Option<String>>> = Lazy::new(|| RwLock::new(None));

/// Make `locale` the active locale for the process
pub fn activate(locale: impl Into<String>) {
	*ACTIVE_LOCALE.write() = Some(locale.into());
}

/// The currently active locale, if any
pub fn active_locale() -> Option<String> {
	ACTIVE_LOCALE.read().clone()
}

/// Clear the active locale
pub fn deactivate() {
	*ACTIVE_LOCALE.write() = None;
}
