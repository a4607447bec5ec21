//! Real-time chat subsystem for ReadRoom.
//!
//! Each book has one chat room. Rooms are created lazily when the first
//! participant joins and removed when the last one leaves; messages are
//! persisted before broadcast so every delivered message carries its
//! server-assigned id and timestamp.

mod gateway;
mod message;
mod registry;

pub use gateway::{ChatGateway, JoinAck};
pub use message::{ChatMessage, MessageReport, MessageRepository, DEFAULT_HISTORY_LIMIT};
pub use registry::{Participant, RoomEvent, RoomRegistry};
