use thiserror::Error;

/// Why a free-text message is not a `key:value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("message is empty")]
    Empty,
    #[error("no ':' separator; use key:value")]
    MissingSeparator,
    #[error("key is empty")]
    EmptyKey,
    #[error("value is empty")]
    EmptyValue,
}

/// Split `text` on the first colon and trim both halves. The value may itself
/// contain colons.
pub fn parse_entry(text: &str) -> Result<(String, String), ParseError> {
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    let (key, value) = text.split_once(':').ok_or(ParseError::MissingSeparator)?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() {
        return Err(ParseError::EmptyKey);
    }
    if value.is_empty() {
        return Err(ParseError::EmptyValue);
    }
    Ok((key.to_string(), value.to_string()))
}
