use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use shared_database::{collections, Filter, FindOptions, SharedStore};
use shared_models::Pagination;

use crate::models::{ChatError, ChatMessage};

/// Durable message log. The store, not the live relay, is the source of truth.
#[derive(Clone)]
pub struct ChatService {
    store: SharedStore,
}

impl ChatService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn send(
        &self,
        sender_id: &str,
        receiver_id: &str,
        body: &str,
    ) -> Result<ChatMessage, ChatError> {
        if sender_id.trim().is_empty() || receiver_id.trim().is_empty() {
            return Err(ChatError::ValidationError(
                "senderId and receiverId are required".to_string(),
            ));
        }
        if body.is_empty() {
            return Err(ChatError::ValidationError("message is required".to_string()));
        }

        let doc = json!({
            "sender_id": sender_id,
            "receiver_id": receiver_id,
            "message": body,
            "timestamp": Utc::now(),
        });

        let stored = self.store.insert_one(collections::CHAT_MESSAGES, doc).await?;
        let message: ChatMessage = serde_json::from_value(stored)?;

        info!("Stored message {} from {} to {}", message.id, sender_id, receiver_id);
        Ok(message)
    }

    /// One page of the conversation between two users, oldest first. Page 0
    /// holds the most recent messages.
    pub async fn history(
        &self,
        user_a: &str,
        user_b: &str,
        pagination: Pagination,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let page_size = pagination
            .page_size()
            .ok_or_else(|| ChatError::ValidationError("limit must be at least 1".to_string()))?;

        let filter = Filter::new().any_of(vec![
            Filter::new().eq("sender_id", user_a).eq("receiver_id", user_b),
            Filter::new().eq("sender_id", user_b).eq("receiver_id", user_a),
        ]);
        // `seq` is the insertion sequence column; it settles equal timestamps
        let options = FindOptions::new()
            .sort_desc("timestamp")
            .sort_desc("seq")
            .skip(pagination.skip(page_size))
            .limit(page_size);

        let docs = self
            .store
            .find(collections::CHAT_MESSAGES, &filter, options)
            .await?;
        debug!(
            "Loaded {} messages between {} and {} (page {})",
            docs.len(),
            user_a,
            user_b,
            pagination.page()
        );

        let mut messages = docs
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ChatMessage>, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}
