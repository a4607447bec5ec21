//! Chat message store.
//!
//! Persists chat messages keyed by book and serves ordered history reads.
//! Messages are immutable once created; moderation reports are recorded
//! alongside without altering message visibility.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::DbPool;
use crate::{ReadRoomError, Result};

/// Default number of recent messages to retrieve.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// A persisted chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Message ID, assigned by the store.
    pub id: i64,
    /// Book (room) the message belongs to.
    pub book_id: i64,
    /// User ID of the author.
    pub author_id: i64,
    /// Display name of the author at the time of sending.
    pub author_name: String,
    /// Message body.
    pub body: String,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Database row type for ChatMessage.
#[derive(sqlx::FromRow)]
struct ChatMessageRow {
    id: i64,
    book_id: i64,
    author_id: i64,
    author_name: String,
    body: String,
    created_at: String,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Self {
            id: row.id,
            book_id: row.book_id,
            author_id: row.author_id,
            author_name: row.author_name,
            body: row.body,
            created_at,
        }
    }
}

/// A recorded moderation report.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageReport {
    /// Report ID.
    pub id: i64,
    /// Reported message ID.
    pub message_id: i64,
    /// User ID of the reporter.
    pub reporter_id: i64,
    /// Reason given by the reporter.
    pub reason: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// Repository for chat message operations.
pub struct MessageRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new MessageRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Append a message to a room.
    ///
    /// The id and timestamp are server-assigned; insertion order under
    /// concurrent sends is whatever order the store serializes them in.
    pub async fn append(
        &self,
        book_id: i64,
        author_id: i64,
        author_name: &str,
        body: &str,
    ) -> Result<ChatMessage> {
        if body.trim().is_empty() {
            return Err(ReadRoomError::Validation("message body is empty".into()));
        }

        let book_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
                .bind(book_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| ReadRoomError::Database(e.to_string()))?;
        if !book_exists {
            return Err(ReadRoomError::NotFound("book".into()));
        }

        let created_at = Utc::now().to_rfc3339();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO chat_messages (book_id, author_id, author_name, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(book_id)
        .bind(author_id)
        .bind(author_name)
        .bind(body)
        .bind(&created_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| ReadRoomError::NotFound("chat message".into()))
    }

    /// Get a message by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<ChatMessage>> {
        let result = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, book_id, author_id, author_name, body, created_at
            FROM chat_messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        Ok(result.map(ChatMessage::from))
    }

    /// Get the most recent messages for a room.
    ///
    /// Returns up to `limit` messages in chronological order (oldest first);
    /// ties on the timestamp are broken by id.
    pub async fn recent(&self, book_id: i64, limit: usize) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, book_id, author_id, author_name, body, created_at
            FROM chat_messages
            WHERE book_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(book_id)
        .bind(limit as i64)
        .fetch_all(self.pool)
        .await
        .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        // Reverse to get chronological order
        let messages: Vec<ChatMessage> = rows.into_iter().map(ChatMessage::from).rev().collect();
        Ok(messages)
    }

    /// Count messages for a room.
    pub async fn count(&self, book_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE book_id = $1")
                .bind(book_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Record a moderation report against a message.
    ///
    /// The message itself is left untouched; reports are reviewed out of
    /// band.
    pub async fn report(
        &self,
        message_id: i64,
        reporter_id: i64,
        reason: &str,
    ) -> Result<MessageReport> {
        let message_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM chat_messages WHERE id = $1)")
                .bind(message_id)
                .fetch_one(self.pool)
                .await
                .map_err(|e| ReadRoomError::Database(e.to_string()))?;
        if !message_exists {
            return Err(ReadRoomError::NotFound("chat message".into()));
        }

        let report = sqlx::query_as::<_, MessageReport>(
            r#"
            INSERT INTO message_reports (message_id, reporter_id, reason)
            VALUES ($1, $2, $3)
            RETURNING id, message_id, reporter_id, reason, created_at
            "#,
        )
        .bind(message_id)
        .bind(reporter_id)
        .bind(reason)
        .fetch_one(self.pool)
        .await
        .map_err(|e| ReadRoomError::Database(e.to_string()))?;

        Ok(report)
    }
}
