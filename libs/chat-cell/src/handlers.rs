use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use shared_models::error::AppError;
use shared_models::Pagination;

use crate::models::{SendMessageRequest, ServerEvent};
use crate::ChatState;

pub async fn get_history(
    State(state): State<ChatState>,
    Path((user1, user2)): Path<(String, String)>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Value>, AppError> {
    let messages = state
        .chat_service()
        .history(&user1, &user2, pagination)
        .await?;

    Ok(Json(json!({
        "messages": messages,
        "page": pagination.page(),
        "limit": pagination.page_size(),
    })))
}

/// Store a message, then push it to the receiver if they are connected.
pub async fn send_message(
    State(state): State<ChatState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let stored = state
        .chat_service()
        .send(&request.sender_id, &request.receiver_id, &request.message)
        .await?;

    let delivered = state
        .presence
        .relay(&stored.receiver_id, ServerEvent::from(&stored))
        .await;
    info!("Message {} delivered live: {}", stored.id, delivered);

    Ok(Json(json!({
        "success": true,
        "message": stored,
        "delivered": delivered
    })))
}

pub async fn online_users(State(state): State<ChatState>) -> Json<Value> {
    let users = state.presence.online_users().await;

    Json(json!({
        "users": users,
        "total": users.len()
    }))
}
