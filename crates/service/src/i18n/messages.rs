use std::{collections::HashMap, path::Path};
use tokio::fs;
use tracing::{debug, info};

use crate::errors::ServiceError;

const NOT_FOUND: &str = "Message not found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    En,
    Ru,
}

impl Lang {
    pub const DEFAULT: Lang = Lang::En;
    pub const SUPPORTED: [Lang; 2] = [Lang::En, Lang::Ru];

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ru => "ru",
        }
    }
}

/// Every reply the bot can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Help,
    ListEmpty,
    Saved,
    SaveFailed,
    RemoveSuccess,
    RemoveFail,
    InvalidFormat,
    UnknownCommand,
    WipeSuccess,
    WipeDenied,
}

impl Intent {
    pub const ALL: [Intent; 11] = [
        Intent::Start,
        Intent::Help,
        Intent::ListEmpty,
        Intent::Saved,
        Intent::SaveFailed,
        Intent::RemoveSuccess,
        Intent::RemoveFail,
        Intent::InvalidFormat,
        Intent::UnknownCommand,
        Intent::WipeSuccess,
        Intent::WipeDenied,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Start => "start",
            Intent::Help => "help",
            Intent::ListEmpty => "list_empty",
            Intent::Saved => "saved",
            Intent::SaveFailed => "save_failed",
            Intent::RemoveSuccess => "remove_success",
            Intent::RemoveFail => "remove_fail",
            Intent::InvalidFormat => "invalid_format",
            Intent::UnknownCommand => "unknown_command",
            Intent::WipeSuccess => "wipe_success",
            Intent::WipeDenied => "wipe_denied",
        }
    }
}

/// Template tables, immutable after load.
#[derive(Debug, Clone)]
pub struct Messages {
    tables: HashMap<String, HashMap<String, String>>,
}

impl Messages {
    /// Read the template file. Missing or malformed files are fatal, as is a
    /// file without every supported language.
    pub async fn load(path: &Path) -> Result<Self, ServiceError> {
        let bytes = fs::read(path).await.map_err(|e| ServiceError::config(path, e))?;
        let tables: HashMap<String, HashMap<String, String>> =
            serde_json::from_slice(&bytes).map_err(|e| ServiceError::config(path, e))?;
        let messages = Self::from_tables(tables)?;
        info!(path = %path.display(), languages = messages.tables.len(), "message templates loaded");
        Ok(messages)
    }

    pub fn from_tables(tables: HashMap<String, HashMap<String, String>>) -> Result<Self, ServiceError> {
        for lang in Lang::SUPPORTED {
            if !tables.contains_key(lang.code()) {
                return Err(ServiceError::Validation(format!(
                    "message templates are missing language '{}'",
                    lang.code()
                )));
            }
        }
        Ok(Self { tables })
    }

    /// Map a client language code onto a supported language. `ru-RU` matches
    /// `ru`; anything unknown or absent falls back to the default.
    pub fn lang_for(code: Option<&str>) -> Lang {
        let Some(code) = code else { return Lang::DEFAULT };
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        Lang::SUPPORTED
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(primary))
            .unwrap_or(Lang::DEFAULT)
    }

    /// Render `intent` in `lang`, falling back to the default language when the
    /// template is missing there.
    pub fn get(&self, lang: Lang, intent: Intent, args: &[&str]) -> String {
        let template = self
            .lookup(lang, intent)
            .or_else(|| self.lookup(Lang::DEFAULT, intent));
        match template {
            Some(t) => render(t, args),
            None => {
                debug!(lang = lang.code(), intent = intent.as_str(), "template missing");
                NOT_FOUND.to_string()
            }
        }
    }

    fn lookup(&self, lang: Lang, intent: Intent) -> Option<&str> {
        self.tables
            .get(lang.code())
            .and_then(|t| t.get(intent.as_str()))
            .map(String::as_str)
    }
}

/// Replace `{n}` with `args[n]`. Placeholders without a matching argument are
/// left as written.
fn render(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            args.get(index).map(|arg| (arg, close))
        });
        match substituted {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
