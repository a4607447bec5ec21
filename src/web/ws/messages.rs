//! WebSocket message types for chat communication.

use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, Participant};

/// Messages sent from client to server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a book's chat room.
    JoinRoom {
        /// Book (room) ID to join.
        book_id: i64,
    },
    /// Send a chat message to the current room.
    SendMessage {
        /// Message body.
        body: String,
    },
    /// Leave the current chat room.
    LeaveRoom,
    /// Heartbeat ping.
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Successfully joined a room.
    Joined {
        /// Book (room) ID.
        book_id: i64,
        /// Recent messages, oldest first.
        history: Vec<ChatMessage>,
        /// Current occupants, the joiner included.
        participants: Vec<ParticipantInfo>,
    },
    /// A chat message, delivered to every occupant including the sender.
    Message {
        /// The persisted message with server-assigned id and timestamp.
        message: ChatMessage,
    },
    /// Another participant joined the room.
    ParticipantJoined {
        /// The participant that joined.
        participant: ParticipantInfo,
    },
    /// A participant left the room or disconnected.
    ParticipantLeft {
        /// The participant that left.
        participant: ParticipantInfo,
    },
    /// Successfully left a room.
    Left {
        /// Book (room) ID.
        book_id: i64,
    },
    /// Error message, sent to the offending session only.
    Error {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
    },
    /// Heartbeat pong response.
    Pong,
}

/// Information about a chat participant on the wire.
///
/// The session id stays server-side.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantInfo {
    /// User ID.
    pub user_id: i64,
    /// Display name.
    pub display_name: String,
}

impl From<&Participant> for ParticipantInfo {
    fn from(participant: &Participant) -> Self {
        Self {
            user_id: participant.user_id,
            display_name: participant.display_name.clone(),
        }
    }
}

impl ServerMessage {
    /// Create an error message.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}
