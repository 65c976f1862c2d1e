use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::models::{ChatError, ClientEvent, SendMessageRequest, ServerEvent};
use crate::services::ConnectionHandle;
use crate::ChatState;

/// Outbound frames buffered per connection before relays start missing.
const OUTBOUND_BUFFER: usize = 64;

pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<ChatState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs one connection: a writer task drains the outbound channel while this
/// task reads client frames until the socket closes.
async fn handle_socket(socket: WebSocket, state: ChatState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER);
    let connection = ConnectionHandle::new(tx);
    info!("WebSocket connection {} opened", connection.id);

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to encode outbound event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => handle_client_event(&state, &connection, event).await,
                Err(e) => {
                    debug!("Unreadable frame on {}: {}", connection.id, e);
                    reply(&connection, format!("Unrecognised event: {}", e)).await;
                }
            },
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    let gone = state.presence.disconnect(connection.id).await;
    debug!("Connection {} released {:?}", connection.id, gone);

    // Last sender goes away with the handle; the writer then flushes and exits
    let connection_id = connection.id;
    drop(connection);
    let _ = writer.await;
    info!("WebSocket connection {} closed", connection_id);
}

pub(crate) async fn handle_client_event(
    state: &ChatState,
    connection: &ConnectionHandle,
    event: ClientEvent,
) {
    match event {
        ClientEvent::Join(user_id) => {
            if user_id.trim().is_empty() {
                reply(connection, "userId is required".to_string()).await;
                return;
            }
            state.presence.join(&user_id, connection.clone()).await;
        }
        ClientEvent::SendMessage(SendMessageRequest {
            sender_id,
            receiver_id,
            message,
        }) => {
            match state
                .chat_service()
                .send(&sender_id, &receiver_id, &message)
                .await
            {
                Ok(stored) => {
                    state
                        .presence
                        .relay(&stored.receiver_id, ServerEvent::from(&stored))
                        .await;
                }
                Err(ChatError::ValidationError(msg)) => reply(connection, msg).await,
                Err(e) => {
                    warn!("Failed to store message from {}: {}", sender_id, e);
                    reply(connection, "Failed to send message".to_string()).await;
                }
            }
        }
    }
}

async fn reply(connection: &ConnectionHandle, message: String) {
    if connection
        .sender()
        .send(ServerEvent::Error { message })
        .await
        .is_err()
    {
        debug!("Connection {} closed before error reply", connection.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReceivedMessage;
    use crate::services::PresenceRegistry;
    use shared_database::Database;
    use shared_models::Pagination;

    fn connection() -> (ConnectionHandle, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectionHandle::new(tx), rx)
    }

    fn send(from: &str, to: &str, body: &str) -> ClientEvent {
        ClientEvent::SendMessage(SendMessageRequest {
            sender_id: from.into(),
            receiver_id: to.into(),
            message: body.into(),
        })
    }

    #[tokio::test]
    async fn message_is_stored_then_relayed_to_online_receiver() {
        let state = ChatState::new(Database::in_memory(), PresenceRegistry::new());
        let (alice, _alice_rx) = connection();
        let (bob, mut bob_rx) = connection();

        handle_client_event(&state, &alice, ClientEvent::Join("alice".into())).await;
        handle_client_event(&state, &bob, ClientEvent::Join("bob".into())).await;
        handle_client_event(&state, &alice, send("alice", "bob", "hello")).await;

        assert_eq!(
            bob_rx.recv().await,
            Some(ServerEvent::ReceiveMessage(ReceivedMessage {
                sender_id: "alice".into(),
                message: "hello".into(),
            }))
        );

        let history = state
            .chat_service()
            .history("bob", "alice", Pagination::default())
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].message, "hello");
    }

    #[tokio::test]
    async fn offline_receiver_still_gets_history() {
        let state = ChatState::new(Database::in_memory(), PresenceRegistry::new());
        let (alice, mut alice_rx) = connection();

        handle_client_event(&state, &alice, send("alice", "bob", "are you there?")).await;

        assert!(alice_rx.try_recv().is_err());
        let history = state
            .chat_service()
            .history("alice", "bob", Pagination::default())
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn invalid_events_get_an_error_reply() {
        let state = ChatState::new(Database::in_memory(), PresenceRegistry::new());
        let (conn, mut rx) = connection();

        handle_client_event(&state, &conn, ClientEvent::Join("  ".into())).await;
        assert!(matches!(rx.recv().await, Some(ServerEvent::Error { .. })));

        handle_client_event(&state, &conn, send("alice", "", "hi")).await;
        assert!(matches!(rx.recv().await, Some(ServerEvent::Error { .. })));
        assert!(state.presence.online_users().await.is_empty());
    }
}
