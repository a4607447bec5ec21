//! Chat gateway.
//!
//! Wires connection sessions to the room registry and the message store.
//! Both ingress paths (the WebSocket protocol and the HTTP fallback) go
//! through the same `publish` operation, so a message is broadcast to live
//! participants no matter how it arrived.

use tokio::sync::broadcast;

use crate::auth::Identity;
use crate::db::{BookRepository, DbPool};
use crate::{ReadRoomError, Result};

use super::message::{ChatMessage, MessageReport, MessageRepository};
use super::registry::{Participant, RoomEvent, RoomRegistry};

/// Reply to a successful room join.
pub struct JoinAck {
    /// Recent messages, oldest first.
    pub history: Vec<ChatMessage>,
    /// Occupants after the join, the joiner included.
    pub participants: Vec<Participant>,
    /// Receiver subscribed to the room's events.
    pub receiver: broadcast::Receiver<RoomEvent>,
}

/// Gateway between connection sessions, the room registry and the store.
pub struct ChatGateway {
    registry: RoomRegistry,
    pool: DbPool,
    history_limit: usize,
}

impl ChatGateway {
    /// Create a new gateway.
    pub fn new(pool: DbPool, history_limit: usize) -> Self {
        Self {
            registry: RoomRegistry::new(),
            pool,
            history_limit,
        }
    }

    /// Get the room registry.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Join a room on behalf of a session.
    ///
    /// The book check and the history read happen before the registry
    /// insert, so a storage failure leaves the registry unchanged. Other
    /// occupants are notified with a `ParticipantJoined` event; the joiner
    /// suppresses its own copy via the session-id filter.
    pub async fn join(
        &self,
        book_id: i64,
        identity: &Identity,
        session_id: &str,
    ) -> Result<JoinAck> {
        let books = BookRepository::new(&self.pool);
        if !books.exists(book_id).await? {
            return Err(ReadRoomError::NotFound("book".into()));
        }

        let history = MessageRepository::new(&self.pool)
            .recent(book_id, self.history_limit)
            .await?;

        let participant = Participant::new(session_id, identity.user_id, &identity.display_name);
        let (participants, receiver) = self.registry.join(book_id, participant.clone()).await;

        tracing::debug!(
            book_id,
            session_id,
            occupants = participants.len(),
            "participant joined room"
        );
        self.registry
            .broadcast(book_id, RoomEvent::ParticipantJoined { participant })
            .await;

        Ok(JoinAck {
            history,
            participants,
            receiver,
        })
    }

    /// Persist a message and broadcast it to every occupant of the room.
    ///
    /// This is the single write path for both the WebSocket protocol and the
    /// HTTP fallback. The broadcast includes the sender, which confirms the
    /// message with its server-assigned id and timestamp. On failure nothing
    /// is broadcast and registry state is unchanged.
    pub async fn publish(
        &self,
        book_id: i64,
        identity: &Identity,
        body: &str,
    ) -> Result<ChatMessage> {
        let message = MessageRepository::new(&self.pool)
            .append(book_id, identity.user_id, &identity.display_name, body)
            .await?;

        self.registry
            .broadcast(
                book_id,
                RoomEvent::Message {
                    message: message.clone(),
                },
            )
            .await;

        Ok(message)
    }

    /// Remove a session from a room.
    ///
    /// Idempotent; returns whether a removal occurred. Remaining occupants
    /// are notified with a `ParticipantLeft` event.
    pub async fn leave(&self, book_id: i64, session_id: &str) -> bool {
        match self.registry.leave(book_id, session_id).await {
            Some(participant) => {
                tracing::debug!(book_id, session_id, "participant left room");
                self.registry
                    .broadcast(book_id, RoomEvent::ParticipantLeft { participant })
                    .await;
                true
            }
            None => false,
        }
    }

    /// Read the most recent messages of a room, oldest first.
    pub async fn recent(&self, book_id: i64, limit: usize) -> Result<Vec<ChatMessage>> {
        let books = BookRepository::new(&self.pool);
        if !books.exists(book_id).await? {
            return Err(ReadRoomError::NotFound("book".into()));
        }

        MessageRepository::new(&self.pool).recent(book_id, limit).await
    }

    /// Record a moderation report against a message.
    pub async fn report(
        &self,
        message_id: i64,
        reporter_id: i64,
        reason: &str,
    ) -> Result<MessageReport> {
        MessageRepository::new(&self.pool)
            .report(message_id, reporter_id, reason)
            .await
    }
}
