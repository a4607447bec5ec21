//! Chat WebSocket handler.
//!
//! One session per connection. A session belongs to at most one room; the
//! room field is mutated only by the join/leave transitions below, never by
//! message handlers.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::auth::{Identity, TokenKeys};
use crate::chat::{ChatGateway, RoomEvent};
use crate::ReadRoomError;

use super::messages::{ClientMessage, ParticipantInfo, ServerMessage};

/// Query parameters for WebSocket connection.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// Bearer token for authentication.
    pub token: String,
}

/// State for the WebSocket chat handler.
#[derive(Clone)]
pub struct ChatWsState {
    /// Chat gateway.
    pub gateway: Arc<ChatGateway>,
    /// Token keys for verifying the connection token.
    pub token_keys: Arc<TokenKeys>,
    /// Idle timeout after which a session is closed.
    pub idle_timeout: Duration,
}

impl ChatWsState {
    /// Create a new chat WebSocket state.
    pub fn new(
        gateway: Arc<ChatGateway>,
        token_keys: Arc<TokenKeys>,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            token_keys,
            idle_timeout,
        }
    }
}

/// WebSocket chat handler.
///
/// GET /api/chat/ws?token={jwt}
///
/// Chat requires a logged-in identity; the token is verified before the
/// upgrade and the connection is rejected with 401 otherwise.
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ChatWsState>>,
    Query(query): Query<WsQuery>,
) -> Response {
    let identity = match state.token_keys.verify(&query.token) {
        Ok(claims) => Identity::from(&claims),
        Err(e) => {
            tracing::debug!("WebSocket connection rejected: {}", e);
            return Response::builder()
                .status(401)
                .body("Unauthorized".into())
                .unwrap();
        }
    };

    tracing::info!(
        "WebSocket connection from user {} ({})",
        identity.display_name,
        identity.user_id
    );

    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<ChatWsState>, identity: Identity) {
    let session_id = format!("ws-{}-{}", identity.user_id, uuid::Uuid::new_v4());

    tracing::debug!(
        "WebSocket session started: {} for user {}",
        session_id,
        identity.display_name
    );

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Session state: at most one joined room
    let mut current_room: Option<i64> = None;
    let mut room_receiver: Option<broadcast::Receiver<RoomEvent>> = None;

    let mut idle_deadline = Instant::now() + state.idle_timeout;

    loop {
        tokio::select! {
            // Handle incoming WebSocket messages
            inbound = ws_receiver.next() => {
                idle_deadline = Instant::now() + state.idle_timeout;
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                handle_client_message(
                                    &mut ws_sender,
                                    &state,
                                    &session_id,
                                    &identity,
                                    client_msg,
                                    &mut current_room,
                                    &mut room_receiver,
                                ).await;
                            }
                            Err(e) => {
                                tracing::debug!("Failed to parse client message: {}", e);
                                send_to_client(
                                    &mut ws_sender,
                                    &ServerMessage::error("invalid_message", "Invalid message format"),
                                ).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!("WebSocket closed by client: {}", session_id);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            // Handle room events
            event = async {
                match room_receiver.as_mut() {
                    Some(receiver) => receiver.recv().await,
                    // No room joined: wait forever, the other branches wake us
                    None => std::future::pending().await,
                }
            } => {
                match event {
                    Ok(event) => {
                        if let Some(server_msg) = room_event_to_server_message(event, &session_id) {
                            if !send_to_client(&mut ws_sender, &server_msg).await {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "WebSocket session {} lagged, skipped {} events",
                            session_id,
                            skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        room_receiver = None;
                    }
                }
            }

            // Idle eviction
            _ = tokio::time::sleep_until(idle_deadline) => {
                tracing::debug!("WebSocket session idle, closing: {}", session_id);
                break;
            }
        }
    }

    // Cleanup: best-effort leave of the current room
    if let Some(book_id) = current_room {
        state.gateway.leave(book_id, &session_id).await;
    }
    tracing::debug!("WebSocket session ended: {}", session_id);
}

/// Handle a client message.
#[allow(clippy::too_many_arguments)]
async fn handle_client_message(
    ws_sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    state: &ChatWsState,
    session_id: &str,
    identity: &Identity,
    msg: ClientMessage,
    current_room: &mut Option<i64>,
    room_receiver: &mut Option<broadcast::Receiver<RoomEvent>>,
) {
    match msg {
        ClientMessage::JoinRoom { book_id } => {
            // Joining a new room implicitly leaves the previous one
            if let Some(old_book_id) = current_room.take() {
                *room_receiver = None;
                state.gateway.leave(old_book_id, session_id).await;
            }

            match state.gateway.join(book_id, identity, session_id).await {
                Ok(ack) => {
                    *room_receiver = Some(ack.receiver);
                    *current_room = Some(book_id);

                    let response = ServerMessage::Joined {
                        book_id,
                        history: ack.history,
                        participants: ack
                            .participants
                            .iter()
                            .map(ParticipantInfo::from)
                            .collect(),
                    };
                    send_to_client(ws_sender, &response).await;
                }
                Err(e) => {
                    send_to_client(ws_sender, &error_to_server_message(&e)).await;
                }
            }
        }

        ClientMessage::SendMessage { body } => {
            match *current_room {
                Some(book_id) => {
                    // The sender's confirmation arrives through the room
                    // broadcast with the server-assigned fields
                    if let Err(e) = state.gateway.publish(book_id, identity, &body).await {
                        send_to_client(ws_sender, &error_to_server_message(&e)).await;
                    }
                }
                None => {
                    send_to_client(
                        ws_sender,
                        &ServerMessage::error("not_in_room", "You are not in a room"),
                    )
                    .await;
                }
            }
        }

        ClientMessage::LeaveRoom => match current_room.take() {
            Some(book_id) => {
                *room_receiver = None;
                state.gateway.leave(book_id, session_id).await;
                send_to_client(ws_sender, &ServerMessage::Left { book_id }).await;
            }
            None => {
                send_to_client(
                    ws_sender,
                    &ServerMessage::error("not_in_room", "You are not in a room"),
                )
                .await;
            }
        },

        ClientMessage::Ping => {
            send_to_client(ws_sender, &ServerMessage::Pong).await;
        }
    }
}

/// Serialize and send a server message; returns false when the socket is gone.
async fn send_to_client(
    ws_sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => ws_sender.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// Convert a room event into the message for this session, if any.
///
/// Join/leave events originating from this session are suppressed: the joiner
/// already got its ack, and a leaver is no longer interested.
fn room_event_to_server_message(event: RoomEvent, session_id: &str) -> Option<ServerMessage> {
    match event {
        RoomEvent::Message { message } => Some(ServerMessage::Message { message }),
        RoomEvent::ParticipantJoined { participant } => {
            if participant.session_id == session_id {
                None
            } else {
                Some(ServerMessage::ParticipantJoined {
                    participant: ParticipantInfo::from(&participant),
                })
            }
        }
        RoomEvent::ParticipantLeft { participant } => {
            if participant.session_id == session_id {
                None
            } else {
                Some(ServerMessage::ParticipantLeft {
                    participant: ParticipantInfo::from(&participant),
                })
            }
        }
    }
}

/// Map a gateway error to the wire error frame.
fn error_to_server_message(err: &ReadRoomError) -> ServerMessage {
    match err {
        ReadRoomError::Validation(msg) => ServerMessage::error("validation_error", msg.clone()),
        ReadRoomError::NotFound(what) => {
            ServerMessage::error("not_found", format!("{what} not found"))
        }
        ReadRoomError::Auth(_) => ServerMessage::error("unauthorized", "Not authorized"),
        _ => {
            tracing::error!("Chat gateway error: {}", err);
            ServerMessage::error("storage_error", "Failed to process the request")
        }
    }
}
