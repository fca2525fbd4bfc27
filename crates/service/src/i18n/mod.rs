//! Localized reply templates
//!
//! Templates live in a JSON file keyed by language code, then by intent name,
//! and use `{0}`, `{1}`, ... as positional placeholders.

pub mod messages;

pub use messages::{Intent, Lang, Messages};
