use serde::{Deserialize, Serialize};

/// Opaque user identifier assigned by the chat transport.
///
/// For private chats the Bot API uses the same integer as both the user id
/// and the chat id, so this type doubles as the delivery address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Parse an operator-supplied identifier, e.g. the argument of `/block`.
    pub fn parse(s: &str) -> Result<Self, UserIdError> {
        if s.is_empty() {
            return Err(UserIdError::Empty);
        }
        s.parse::<i64>()
            .map(UserId)
            .map_err(|_| UserIdError::NotNumeric(s.to_string()))
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when parsing a user identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdError {
    Empty,
    NotNumeric(String),
}

impl std::fmt::Display for UserIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserIdError::Empty => write!(f, "user id cannot be empty"),
            UserIdError::NotNumeric(s) => write!(f, "user id is not numeric: {}", s),
        }
    }
}

impl std::error::Error for UserIdError {}

/// Transport-assigned message identifier, unique within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
