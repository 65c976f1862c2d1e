use std::collections::HashSet;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use serde_json::json;
use tokio::sync::mpsc;
use tower::ServiceExt;

use chat_cell::models::{ChatError, ChatMessage, ServerEvent};
use chat_cell::services::{ChatService, ConnectionHandle, PresenceRegistry};
use chat_cell::{chat_routes, ChatState};
use shared_models::Pagination;
use shared_utils::test_utils::{empty_request, json_request, memory_database, read_json};

async fn seed_conversation(service: &ChatService, count: usize) -> Vec<ChatMessage> {
    let mut sent = Vec::with_capacity(count);
    for i in 0..count {
        let (from, to) = if i % 2 == 0 { ("alice", "bob") } else { ("bob", "alice") };
        sent.push(service.send(from, to, &format!("message {}", i)).await.unwrap());
    }
    sent
}

#[tokio::test]
async fn test_history_pages_newest_first_returned_oldest_first() {
    let (db, _) = memory_database();
    let service = ChatService::new(db.documents.clone());
    let sent = seed_conversation(&service, 25).await;

    let page0 = service
        .history("alice", "bob", Pagination::new(0, 20))
        .await
        .unwrap();
    let page1 = service
        .history("bob", "alice", Pagination::new(1, 20))
        .await
        .unwrap();

    assert_eq!(page0.len(), 20);
    assert_eq!(page0, sent[5..].to_vec());
    assert_eq!(page1.len(), 5);
    assert_eq!(page1, sent[..5].to_vec());

    let page2 = service
        .history("alice", "bob", Pagination::new(2, 20))
        .await
        .unwrap();
    assert!(page2.is_empty());
}

#[tokio::test]
async fn test_pages_reconstruct_the_whole_exchange() {
    let (db, _) = memory_database();
    let service = ChatService::new(db.documents.clone());
    let sent = seed_conversation(&service, 23).await;

    let mut pages = Vec::new();
    for page in 0.. {
        let messages = service
            .history("alice", "bob", Pagination::new(page, 7))
            .await
            .unwrap();
        if messages.is_empty() {
            break;
        }
        pages.push(messages);
    }

    // Later pages hold older messages
    let rebuilt: Vec<ChatMessage> = pages.into_iter().rev().flatten().collect();
    let unique: HashSet<&str> = rebuilt.iter().map(|m| m.id.as_str()).collect();

    assert_eq!(rebuilt, sent);
    assert_eq!(unique.len(), sent.len());
}

#[tokio::test]
async fn test_history_excludes_other_conversations() {
    let (db, _) = memory_database();
    let service = ChatService::new(db.documents.clone());

    service.send("alice", "bob", "for bob").await.unwrap();
    service.send("alice", "carol", "for carol").await.unwrap();
    service.send("carol", "bob", "carol to bob").await.unwrap();

    let history = service
        .history("alice", "bob", Pagination::default())
        .await
        .unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "for bob");
}

#[tokio::test]
async fn test_newest_message_is_last_on_first_page() {
    let (db, _) = memory_database();
    let service = ChatService::new(db.documents.clone());
    seed_conversation(&service, 30).await;

    let latest = service.send("bob", "alice", "latest").await.unwrap();
    let page0 = service
        .history("alice", "bob", Pagination::default())
        .await
        .unwrap();

    assert_eq!(page0.last(), Some(&latest));
}

#[tokio::test]
async fn test_zero_limit_is_rejected() {
    let (db, _) = memory_database();
    let service = ChatService::new(db.documents.clone());

    let result = service
        .history("alice", "bob", Pagination::new(0, 0))
        .await;
    assert_matches!(result, Err(ChatError::ValidationError(_)));
}

#[tokio::test]
async fn test_http_send_relays_to_connected_receiver() {
    let (db, _) = memory_database();
    let presence = PresenceRegistry::new();
    let app = chat_routes(ChatState::new(db, presence.clone()));

    let (tx, mut rx) = mpsc::channel(4);
    presence.join("bob", ConnectionHandle::new(tx)).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/chat",
            json!({ "senderId": "alice", "receiverId": "bob", "message": "ping" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["delivered"], true);
    assert_eq!(body["message"]["sender_id"], "alice");

    let pushed = rx.recv().await.unwrap();
    assert_eq!(
        serde_json::to_value(&pushed).unwrap(),
        json!({ "event": "receive_message", "data": { "senderId": "alice", "message": "ping" } })
    );
    assert!(matches!(pushed, ServerEvent::ReceiveMessage(_)));

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/chat/online"))
        .await
        .unwrap();
    assert_eq!(read_json(response).await["users"], json!(["bob"]));

    let response = app
        .oneshot(empty_request("GET", "/chat/bob/alice?page=0&limit=10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let history = read_json(response).await;
    assert_eq!(history["messages"][0]["message"], "ping");
    assert_eq!(history["limit"], 10);
}

#[tokio::test]
async fn test_http_send_to_offline_user() {
    let (db, _) = memory_database();
    let app = chat_routes(ChatState::new(db, PresenceRegistry::new()));

    let response = app
        .oneshot(json_request(
            "POST",
            "/chat",
            json!({ "senderId": "alice", "receiverId": "bob", "message": "later" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["delivered"], false);
}

#[tokio::test]
async fn test_history_limit_is_clamped() {
    let (db, _) = memory_database();
    let app = chat_routes(ChatState::new(db, PresenceRegistry::new()));

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/chat/a/b?limit=1000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["limit"], 100);

    let response = app
        .oneshot(empty_request("GET", "/chat/a/b?limit=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
