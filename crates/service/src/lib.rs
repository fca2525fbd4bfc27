//! Service layer for the note bot.
//! - `storage`: the JSON-file-backed key-value store.
//! - `access`: the allow-list gate.
//! - `i18n`: localized reply templates.
//! - `bot`: message routing and the update worker.

pub mod errors;
pub mod storage;
pub mod access;
pub mod i18n;
pub mod bot;
#[cfg(test)]
pub mod test_support;
