use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::access::AllowList;
use crate::bot::inbound::{Body, Inbound, Reply};
use crate::bot::parse::parse_entry;
use crate::i18n::{Intent, Lang, Messages};
use crate::storage::{Listing, NoteStore};

/// Who may do what.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    /// Only this principal may wipe the store.
    pub admin_id: i64,
    /// When set, events from senders outside the allow-list are dropped.
    pub enforce_allow_list: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Start,
    List,
    Help,
    Remove(&'a str),
    Wipe,
    Unknown,
}

impl<'a> Command<'a> {
    fn parse(name: &str, args: &'a str) -> Self {
        match name {
            "start" => Command::Start,
            "list" => Command::List,
            "help" => Command::Help,
            "remove" => Command::Remove(args.trim()),
            "wipe" => Command::Wipe,
            _ => Command::Unknown,
        }
    }
}

/// Turns inbound events into store calls and localized replies. Holds no
/// state of its own beyond shared handles.
pub struct MessageRouter {
    store: Arc<NoteStore>,
    allow_list: Arc<AllowList>,
    messages: Arc<Messages>,
    policy: AccessPolicy,
}

impl MessageRouter {
    pub fn new(
        store: Arc<NoteStore>,
        allow_list: Arc<AllowList>,
        messages: Arc<Messages>,
        policy: AccessPolicy,
    ) -> Self {
        Self { store, allow_list, messages, policy }
    }

    /// Handle one event. `None` means the sender was filtered out and nothing
    /// should be sent back.
    pub async fn handle(&self, event: &Inbound) -> Option<Reply> {
        if self.policy.enforce_allow_list && !self.allow_list.is_allowed(event.sender_id) {
            debug!(sender_id = event.sender_id, "sender not allow-listed, ignoring");
            return None;
        }

        let lang = Messages::lang_for(event.language_code.as_deref());
        let text = match &event.body {
            Body::Command { name, args } => self.command(lang, event.sender_id, Command::parse(name, args)).await,
            Body::Text(text) => self.assign(lang, text).await,
        };
        Some(Reply { chat_id: event.chat_id, text })
    }

    async fn command(&self, lang: Lang, sender_id: i64, command: Command<'_>) -> String {
        debug!(sender_id, ?command, "command");
        match command {
            Command::Start => self.say(lang, Intent::Start, &[]),
            Command::Help => self.say(lang, Intent::Help, &[]),
            Command::List => match self.store.list().await {
                Listing::Empty => self.say(lang, Intent::ListEmpty, &[]),
                Listing::Entries(entries) => entries
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            },
            Command::Remove("") => self.say(lang, Intent::InvalidFormat, &[]),
            Command::Remove(key) => match self.store.remove(key).await {
                Ok((key, true)) => self.say(lang, Intent::RemoveSuccess, &[key.as_str()]),
                Ok((key, false)) => self.say(lang, Intent::RemoveFail, &[key.as_str()]),
                Err(_) => self.say(lang, Intent::SaveFailed, &[]),
            },
            Command::Wipe if sender_id == self.policy.admin_id => match self.store.wipe().await {
                Ok(()) => {
                    info!(sender_id, "store wiped by administrator");
                    self.say(lang, Intent::WipeSuccess, &[])
                }
                Err(_) => self.say(lang, Intent::SaveFailed, &[]),
            },
            Command::Wipe => {
                warn!(sender_id, "wipe denied");
                self.say(lang, Intent::WipeDenied, &[])
            }
            Command::Unknown => self.say(lang, Intent::UnknownCommand, &[]),
        }
    }

    async fn assign(&self, lang: Lang, text: &str) -> String {
        let (key, value) = match parse_entry(text) {
            Ok(pair) => pair,
            Err(e) => {
                debug!(error = %e, "rejected free text");
                return self.say(lang, Intent::InvalidFormat, &[]);
            }
        };
        match self.store.add(key.clone(), value.clone()).await {
            Ok(()) => self.say(lang, Intent::Saved, &[key.as_str(), value.as_str()]),
            Err(_) => self.say(lang, Intent::SaveFailed, &[]),
        }
    }

    fn say(&self, lang: Lang, intent: Intent, args: &[&str]) -> String {
        self.messages.get(lang, intent, args)
    }
}
