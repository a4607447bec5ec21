//! Database schema and migrations for ReadRoom.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users table - identity collaborator contract
    r#"
-- Users table. Password storage and registration live in the external
-- authentication collaborator; the chat core only needs identity lookup.
CREATE TABLE users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    display_name  TEXT NOT NULL,
    created_at    TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_users_username ON users(username);
"#,
    // v2: Books table - each book is a chat room key
    r#"
-- Books table. Catalog search and enrichment live in the external search
-- collaborator; the chat core needs the room-exists check.
CREATE TABLE books (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    author      TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v3: Chat messages table
    r#"
-- Chat messages, immutable once created. author_name is denormalized so a
-- message keeps the display name the author had when sending.
CREATE TABLE chat_messages (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id      INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    author_id    INTEGER NOT NULL REFERENCES users(id),
    author_name  TEXT NOT NULL,
    body         TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX idx_chat_messages_book_id ON chat_messages(book_id);
CREATE INDEX idx_chat_messages_created_at ON chat_messages(created_at);
"#,
    // v4: Message reports table
    r#"
-- Moderation reports. Recording a report never changes message visibility;
-- review happens out of band.
CREATE TABLE message_reports (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id   INTEGER NOT NULL REFERENCES chat_messages(id) ON DELETE CASCADE,
    reporter_id  INTEGER NOT NULL REFERENCES users(id),
    reason       TEXT NOT NULL,
    created_at   TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_message_reports_message_id ON message_reports(message_id);
"#,
];
