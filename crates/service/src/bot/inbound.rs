/// Transport-neutral inbound chat event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub sender_id: i64,
    pub language_code: Option<String>,
    pub chat_id: i64,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Command { name: String, args: String },
    Text(String),
}

impl Inbound {
    /// Classify raw message text. A leading `/` followed by a name marks a
    /// command; a `@botname` suffix on the name is dropped and the arguments
    /// are trimmed. A bare `/` is plain text.
    pub fn from_text(sender_id: i64, language_code: Option<String>, chat_id: i64, text: &str) -> Self {
        let body = text
            .strip_prefix('/')
            .and_then(parse_command)
            .unwrap_or_else(|| Body::Text(text.to_string()));
        Self { sender_id, language_code, chat_id, body }
    }
}

fn parse_command(command: &str) -> Option<Body> {
    let (head, args) = command
        .split_once(char::is_whitespace)
        .unwrap_or((command, ""));
    let name = head.split('@').next().unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    Some(Body::Command { name: name.to_string(), args: args.trim().to_string() })
}

/// Outbound reply for one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub chat_id: i64,
    pub text: String,
}
