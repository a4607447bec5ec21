//! ReadRoom - book discussion server
//!
//! A web application for discussing books: users chat in real time in
//! per-book rooms over WebSocket, with an HTTP fallback path for reading and
//! posting messages.

pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod web;

pub use auth::{Claims, Identity, TokenKeys};
pub use chat::{
    ChatGateway, ChatMessage, MessageReport, MessageRepository, Participant, RoomEvent,
    RoomRegistry,
};
pub use config::Config;
pub use db::{Book, BookRepository, Database, DbPool, NewBook, NewUser, User, UserRepository};
pub use error::{ReadRoomError, Result};
pub use web::server::WebServer;
