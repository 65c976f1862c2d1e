use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, websocket, ChatState};

pub fn chat_routes(state: ChatState) -> Router {
    Router::new()
        .route("/chat", post(handlers::send_message))
        .route("/chat/online", get(handlers::online_users))
        .route("/chat/{user1}/{user2}", get(handlers::get_history))
        .route("/ws", get(websocket::ws_upgrade))
        .with_state(state)
}
