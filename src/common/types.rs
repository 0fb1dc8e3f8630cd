use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Sender tag used for replies produced by the completion API.
pub const RESPONDER_ID: &str = "YandexGPT";

/// A message stored in the shared room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    /// Milliseconds since the Unix epoch, assigned by the author.
    pub timestamp: i64,
    pub sender_id: String,
}

/// A message that has not been written yet; the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub text: String,
    pub timestamp: i64,
    pub sender_id: String,
}

impl NewMessage {
    pub fn now(text: impl Into<String>, sender_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
            sender_id: sender_id.into(),
        }
    }

    pub fn into_message(self, id: String) -> ChatMessage {
        ChatMessage {
            id,
            text: self.text,
            timestamp: self.timestamp,
            sender_id: self.sender_id,
        }
    }
}
