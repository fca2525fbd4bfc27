#![cfg(test)]
use std::{collections::HashMap, path::PathBuf};
use uuid::Uuid;

use crate::i18n::{Intent, Messages};

pub fn temp_store_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("svc_{tag}_{}.json", Uuid::new_v4()))
}

/// Templates whose text names the intent, so assertions stay readable.
pub fn messages() -> Messages {
    let en: HashMap<String, String> = [
        (Intent::Start, "start"),
        (Intent::Help, "help"),
        (Intent::ListEmpty, "list_empty"),
        (Intent::Saved, "saved {0}={1}"),
        (Intent::SaveFailed, "save_failed"),
        (Intent::RemoveSuccess, "removed {0}"),
        (Intent::RemoveFail, "missing {0}"),
        (Intent::InvalidFormat, "invalid_format"),
        (Intent::UnknownCommand, "unknown_command"),
        (Intent::WipeSuccess, "wipe_success"),
        (Intent::WipeDenied, "wipe_denied"),
    ]
    .into_iter()
    .map(|(intent, text)| (intent.as_str().to_string(), text.to_string()))
    .collect();
    let ru: HashMap<String, String> =
        [(Intent::Start.as_str().to_string(), "старт".to_string())].into_iter().collect();
    let tables = [("en".to_string(), en), ("ru".to_string(), ru)].into_iter().collect();
    Messages::from_tables(tables).expect("fixture templates are valid")
}
