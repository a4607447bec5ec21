//! In-memory room registry.
//!
//! Maps book ids to the set of currently connected participants and carries
//! the broadcast fan-out for each room. Rooms are not persisted; the registry
//! is rebuilt from connection state alone.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};

use super::message::ChatMessage;

/// Maximum number of events to buffer per room broadcast channel.
const CHANNEL_CAPACITY: usize = 100;

/// A chat participant: one identity on one connection session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Connection session ID.
    pub session_id: String,
    /// User ID.
    pub user_id: i64,
    /// Display name.
    pub display_name: String,
}

impl Participant {
    /// Create a new participant.
    pub fn new(
        session_id: impl Into<String>,
        user_id: i64,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_id,
            display_name: display_name.into(),
        }
    }
}

/// An event fanned out to every session subscribed to a room.
///
/// Join/leave events carry the originating participant; the session loop
/// uses its session id to suppress self-echo of those events. Message events
/// are delivered to everyone, sender included, so the sender sees the
/// server-canonical message.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// A persisted chat message.
    Message {
        /// The message with server-assigned id and timestamp.
        message: ChatMessage,
    },
    /// A participant joined the room.
    ParticipantJoined {
        /// The participant that joined.
        participant: Participant,
    },
    /// A participant left the room or disconnected.
    ParticipantLeft {
        /// The participant that left.
        participant: Participant,
    },
}

/// A single room: its occupants and its broadcast channel.
struct Room {
    participants: HashMap<String, Participant>,
    sender: broadcast::Sender<RoomEvent>,
}

impl Room {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            participants: HashMap::new(),
            sender,
        }
    }
}

/// Registry of active chat rooms.
///
/// Shared across all sessions. Join and leave take the map write lock, so
/// membership mutations for a room are serialized; reads are
/// snapshot-consistent.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<i64, Room>>,
}

impl RoomRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Register a participant under a room, creating the room if absent.
    ///
    /// Re-joining with an existing session id replaces the previous entry, so
    /// a room never holds duplicate sessions. Returns the participant set
    /// after insertion and a receiver subscribed to the room's events.
    pub async fn join(
        &self,
        book_id: i64,
        participant: Participant,
    ) -> (Vec<Participant>, broadcast::Receiver<RoomEvent>) {
        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(book_id).or_insert_with(Room::new);

        room.participants
            .insert(participant.session_id.clone(), participant);

        let participants: Vec<Participant> = room.participants.values().cloned().collect();
        let receiver = room.sender.subscribe();

        (participants, receiver)
    }

    /// Remove the participant matching a session id from a room.
    ///
    /// Idempotent: returns `None` if the room or participant was not found.
    /// The registry entry is deleted when the room empties.
    pub async fn leave(&self, book_id: i64, session_id: &str) -> Option<Participant> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&book_id)?;
        let removed = room.participants.remove(session_id);

        if room.participants.is_empty() {
            rooms.remove(&book_id);
        }

        removed
    }

    /// Read-only snapshot of a room's current occupants.
    pub async fn broadcast_target(&self, book_id: i64) -> Vec<Participant> {
        let rooms = self.rooms.read().await;
        rooms
            .get(&book_id)
            .map(|room| room.participants.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Fan an event out to every subscriber of a room.
    ///
    /// Returns the number of receivers reached; a missing room is a no-op.
    pub async fn broadcast(&self, book_id: i64, event: RoomEvent) -> usize {
        let rooms = self.rooms.read().await;
        match rooms.get(&book_id) {
            Some(room) => room.sender.send(event).unwrap_or(0),
            None => 0,
        }
    }

    /// Get the number of active rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Get the number of participants in a room.
    pub async fn participant_count(&self, book_id: i64) -> usize {
        let rooms = self.rooms.read().await;
        rooms
            .get(&book_id)
            .map(|room| room.participants.len())
            .unwrap_or(0)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
