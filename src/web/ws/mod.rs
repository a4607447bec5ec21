//! WebSocket chat gateway for the Web API.

mod chat;
mod messages;

pub use chat::{chat_ws_handler, ChatWsState};
pub use messages::{ClientMessage, ParticipantInfo, ServerMessage};
