pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod websocket;

pub use models::*;
pub use router::chat_routes;
pub use services::{ChatService, PresenceRegistry};

use shared_database::Database;

/// State shared by the chat HTTP routes and WebSocket connections.
#[derive(Clone)]
pub struct ChatState {
    pub db: Database,
    pub presence: PresenceRegistry,
}

impl ChatState {
    pub fn new(db: Database, presence: PresenceRegistry) -> Self {
        Self { db, presence }
    }

    pub fn chat_service(&self) -> ChatService {
        ChatService::new(self.db.documents.clone())
    }
}
