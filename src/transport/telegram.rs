// ============================================================================
// Telegram Transport - Bot API adapter
// ============================================================================
//
// Thin HTTPS client for the Bot API methods the gateway needs: sendMessage,
// forwardMessage, copyMessage, getUpdates (long polling) and getMe. The rest
// of the crate never sees these wire types; updates are converted into
// `Inbound` events at this boundary.
//
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::Config;
use crate::error::TransportError;
use crate::transport::{Inbound, InboundKind, Sender, Transport, parse_command};
use crate::types::{MessageId, UserId};

use async_trait::async_trait;

// Slack the long poll gets on top of its server-side hold time before the
// HTTP request itself is considered dead.
const POLL_GRACE_SECS: u64 = 10;

/// Bot API client. Cheap to clone; holds a pooled HTTP client.
#[derive(Clone)]
pub struct TelegramTransport {
    http: reqwest::Client,
    /// `{api_base}/bot{token}`. Never log this, it embeds the credential.
    base_url: String,
    poll_timeout_secs: u64,
}

impl TelegramTransport {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/bot{}",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, TransportError>
    where
        P: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call_with_timeout(method, params, None).await
    }

    async fn call_with_timeout<P, T>(
        &self,
        method: &str,
        params: &P,
        timeout: Option<Duration>,
    ) -> Result<T, TransportError>
    where
        P: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // without_url: reqwest errors carry the request URL, which here
        // embeds the bot token.
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Http(e.without_url()))?;
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::Http(e.without_url()))?;

        if !body.ok {
            return Err(TransportError::Api {
                code: body.error_code.unwrap_or(0),
                description: body
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        body.result.ok_or(TransportError::EmptyResult)
    }

    /// Validate the credential and fetch the bot's own identity.
    pub async fn get_me(&self) -> Result<BotProfile, TransportError> {
        self.call("getMe", &json!({})).await
    }

    /// Long-poll for the next batch of updates. `offset` acknowledges every
    /// update with a smaller id.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        self.call_with_timeout(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": self.poll_timeout_secs,
                "allowed_updates": ["message"],
            }),
            Some(Duration::from_secs(self.poll_timeout_secs + POLL_GRACE_SECS)),
        )
        .await
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, to: UserId, text: &str) -> Result<MessageId, TransportError> {
        let message: WireMessage = self
            .call("sendMessage", &json!({ "chat_id": to, "text": text }))
            .await?;
        Ok(MessageId(message.message_id))
    }

    async fn forward(
        &self,
        to: UserId,
        from_chat: UserId,
        message: MessageId,
    ) -> Result<MessageId, TransportError> {
        let forwarded: WireMessage = self
            .call(
                "forwardMessage",
                &json!({
                    "chat_id": to,
                    "from_chat_id": from_chat,
                    "message_id": message,
                }),
            )
            .await?;
        Ok(MessageId(forwarded.message_id))
    }

    async fn copy(
        &self,
        to: UserId,
        from_chat: UserId,
        message: MessageId,
    ) -> Result<(), TransportError> {
        let _copied: WireMessageId = self
            .call(
                "copyMessage",
                &json!({
                    "chat_id": to,
                    "from_chat_id": from_chat,
                    "message_id": message,
                }),
            )
            .await?;
        Ok(())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BotProfile {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<WireMessage>,
}

impl Update {
    /// Convert into a transport-agnostic event. Updates that carry no
    /// message, or messages with no sender (channel posts), yield `None`.
    pub fn into_inbound(self) -> Option<Inbound> {
        let message = self.message?;
        let from = message.from?;

        let kind = match message.text.as_deref().and_then(parse_command) {
            Some((name, args)) => InboundKind::Command { name, args },
            None => InboundKind::Message,
        };

        Some(Inbound {
            sender: Sender {
                id: UserId(from.id),
                display_name: from.first_name,
                handle: from.username,
            },
            message_id: MessageId(message.message_id),
            reply_to: message.reply_to_message.map(|r| MessageId(r.message_id)),
            kind,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireMessage {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<WireUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reply_to_message: Option<Box<WireMessage>>,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessageId {
    message_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_with_text_becomes_message_event() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 7,
                "message": {
                    "message_id": 55,
                    "from": {"id": 111, "first_name": "Alice", "username": "alice1"},
                    "chat": {"id": 111, "type": "private"},
                    "text": "hello"
                }
            }"#,
        )
        .unwrap();

        let inbound = update.into_inbound().unwrap();
        assert_eq!(inbound.sender.id, UserId(111));
        assert_eq!(inbound.sender.display_name, "Alice");
        assert_eq!(inbound.sender.handle.as_deref(), Some("alice1"));
        assert_eq!(inbound.message_id, MessageId(55));
        assert_eq!(inbound.reply_to, None);
        assert_eq!(inbound.kind, InboundKind::Message);
    }

    #[test]
    fn test_update_with_command_is_tokenized() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 8,
                "message": {
                    "message_id": 56,
                    "from": {"id": 42, "first_name": "Op"},
                    "chat": {"id": 42, "type": "private"},
                    "text": "/block 111"
                }
            }"#,
        )
        .unwrap();

        let inbound = update.into_inbound().unwrap();
        assert_eq!(inbound.sender.handle, None);
        assert_eq!(
            inbound.kind,
            InboundKind::Command {
                name: "block".to_string(),
                args: vec!["111".to_string()],
            }
        );
    }

    #[test]
    fn test_reply_carries_replied_to_id() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 9,
                "message": {
                    "message_id": 57,
                    "from": {"id": 42, "first_name": "Op"},
                    "chat": {"id": 42, "type": "private"},
                    "text": "hi back",
                    "reply_to_message": {"message_id": 55, "chat": {"id": 42, "type": "private"}}
                }
            }"#,
        )
        .unwrap();

        let inbound = update.into_inbound().unwrap();
        assert_eq!(inbound.reply_to, Some(MessageId(55)));
    }

    #[test]
    fn test_media_message_without_text_is_still_an_event() {
        // Photos, stickers etc. arrive with no text; they forward fine.
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 10,
                "message": {
                    "message_id": 58,
                    "from": {"id": 111, "first_name": "Alice"},
                    "chat": {"id": 111, "type": "private"}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(update.into_inbound().unwrap().kind, InboundKind::Message);
    }

    #[test]
    fn test_update_without_message_is_skipped() {
        let update: Update = serde_json::from_str(r#"{"update_id": 11}"#).unwrap();
        assert!(update.into_inbound().is_none());
    }

    #[test]
    fn test_api_error_envelope() {
        let body: ApiResponse<WireMessage> = serde_json::from_str(
            r#"{"ok": false, "error_code": 403, "description": "Forbidden: bot was blocked by the user"}"#,
        )
        .unwrap();
        assert!(!body.ok);
        assert_eq!(body.error_code, Some(403));
        assert!(body.result.is_none());
    }
}
