pub mod telegram;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::{MessageId, UserId};

pub use telegram::TelegramTransport;

/// Outbound side of the chat transport, as seen by the Router.
///
/// Forward and copy differ on purpose: a forward carries "forwarded from X"
/// provenance and is used to show the operator who wrote in; a copy delivers
/// content as a plain direct message and is used for operator replies so the
/// user never sees where the reply came from.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send plain text, returning the id of the new message.
    async fn send_text(&self, to: UserId, text: &str) -> Result<MessageId, TransportError>;

    /// Forward an existing message, returning the id of the forwarded copy
    /// in the recipient's chat.
    async fn forward(
        &self,
        to: UserId,
        from_chat: UserId,
        message: MessageId,
    ) -> Result<MessageId, TransportError>;

    /// Copy an existing message without provenance metadata.
    async fn copy(
        &self,
        to: UserId,
        from_chat: UserId,
        message: MessageId,
    ) -> Result<(), TransportError>;
}

/// Who sent an inbound message, with display metadata as of that message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub display_name: String,
    pub handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// Ordinary content: text, media, anything forwardable.
    Message,
    /// A slash command with whitespace-split arguments.
    Command { name: String, args: Vec<String> },
}

/// One inbound transport event, already stripped of wire-format detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub sender: Sender,
    pub message_id: MessageId,
    /// Set when this message is a reply to an earlier one in the same chat.
    pub reply_to: Option<MessageId>,
    pub kind: InboundKind,
}

/// Tokenize a slash command: `/name@botname arg1 arg2` → (`name`, args).
/// Returns `None` for anything that is not a command.
pub fn parse_command(text: &str) -> Option<(String, Vec<String>)> {
    let rest = text.strip_prefix('/')?;
    let mut tokens = rest.split_whitespace();
    let head = tokens.next()?;
    if head.is_empty() {
        return None;
    }
    // Clients append the bot's handle in group chats: "/users@my_bot".
    let name = head.split('@').next().unwrap_or(head).to_string();
    if name.is_empty() {
        return None;
    }
    let args = tokens.map(str::to_string).collect();
    Some((name, args))
}
