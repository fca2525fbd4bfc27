//! Telegram Bot API transport
//!
//! Webhook update payloads are decoded into transport-neutral [`Inbound`]
//! events; replies go out through `sendMessage`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use service::bot::{Inbound, Reply, ReplySender};
use service::errors::ServiceError;

use crate::errors::TransportError;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// Messages only; anything without a sender is dropped. A message without
    /// text (a photo, a sticker) is treated as empty text.
    pub fn into_inbound(self) -> Option<Inbound> {
        let message = self.message?;
        let from = message.from?;
        let text = message.text.unwrap_or_default();
        Some(Inbound::from_text(from.id, from.language_code, message.chat.id, &text))
    }
}

/// Minimal Bot API client. The token is part of every URL, so request errors
/// are logged without their URL.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_base_url: &str, token: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http { method: "client", message: e.to_string() })?;
        let base_url = format!("{}/bot{}", api_base_url.trim_end_matches('/'), token);
        Ok(Self { http, base_url })
    }

    async fn call(&self, method: &'static str, params: &Value) -> Result<Value, TransportError> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .http
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(|e| TransportError::Http { method, message: e.without_url().to_string() })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Http { method, message: e.without_url().to_string() })?;

        let parsed: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Api { description: body, code: u64::from(status.as_u16()) });
            }
            Err(e) => return Err(TransportError::InvalidResponse { method, message: e.to_string() }),
        };

        // Telegram wraps results in {"ok": true, "result": ...}
        if !status.is_success() || parsed.get("ok").and_then(Value::as_bool) != Some(true) {
            return Err(api_error(&parsed, status.as_u16()));
        }
        parsed
            .get("result")
            .cloned()
            .ok_or_else(|| TransportError::InvalidResponse { method, message: "ok without result".into() })
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        self.call("sendMessage", &json!({ "chat_id": chat_id, "text": text })).await?;
        debug!(chat_id, "reply sent");
        Ok(())
    }

    /// Point Telegram at our webhook endpoint. With a secret, Telegram echoes
    /// it in `X-Telegram-Bot-Api-Secret-Token` on every update.
    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TransportError> {
        let mut params = json!({ "url": url });
        if let Some(secret) = secret {
            params["secret_token"] = json!(secret);
        }
        self.call("setWebhook", &params).await?;
        info!(%url, "webhook registered");
        Ok(())
    }
}

fn api_error(body: &Value, status: u16) -> TransportError {
    let description = body
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string();
    let code = body
        .get("error_code")
        .and_then(Value::as_u64)
        .unwrap_or(u64::from(status));
    TransportError::Api { description, code }
}

#[async_trait]
impl ReplySender for TelegramClient {
    async fn send(&self, reply: &Reply) -> Result<(), ServiceError> {
        self.send_message(reply.chat_id, &reply.text)
            .await
            .map_err(|e| ServiceError::Delivery(e.to_string()))
    }
}
