use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_database::StoreError;
use shared_models::error::AppError;

// ==============================================================================
// CHAT MODELS
// ==============================================================================

/// A stored point-to-point message. Never modified after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(alias = "sender_id")]
    pub sender_id: String,
    #[serde(alias = "receiver_id")]
    pub receiver_id: String,
    pub message: String,
}

// ==============================================================================
// REAL-TIME EVENTS
// ==============================================================================

/// Frames a client sends, as `{"event": "...", "data": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Join(String),
    SendMessage(SendMessageRequest),
}

/// Frames the server pushes to a connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ReceiveMessage(ReceivedMessage),
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedMessage {
    pub sender_id: String,
    pub message: String,
}

impl From<&ChatMessage> for ServerEvent {
    fn from(message: &ChatMessage) -> Self {
        ServerEvent::ReceiveMessage(ReceivedMessage {
            sender_id: message.sender_id.clone(),
            message: message.message.clone(),
        })
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Stored message is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::ValidationError(msg) => AppError::ValidationError(msg),
            ChatError::Storage(e) => e.into(),
            ChatError::Malformed(e) => AppError::Database(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_parse() {
        let join: ClientEvent =
            serde_json::from_value(json!({ "event": "join", "data": "user-1" })).unwrap();
        assert!(matches!(join, ClientEvent::Join(ref id) if id == "user-1"));

        let send: ClientEvent = serde_json::from_value(json!({
            "event": "send_message",
            "data": { "senderId": "a", "receiverId": "b", "message": "hi" }
        }))
        .unwrap();
        match send {
            ClientEvent::SendMessage(req) => {
                assert_eq!(req.sender_id, "a");
                assert_eq!(req.receiver_id, "b");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn receive_message_wire_format() {
        let event = ServerEvent::ReceiveMessage(ReceivedMessage {
            sender_id: "a".into(),
            message: "hi".into(),
        });
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "event": "receive_message", "data": { "senderId": "a", "message": "hi" } })
        );
    }
}
