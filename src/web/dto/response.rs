//! Response DTOs for the Web API.

use serde::Serialize;

use crate::chat::ChatMessage;

/// Room history response.
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    /// Messages in chronological order (oldest first).
    pub messages: Vec<ChatMessage>,
}

/// Created message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// The persisted message with server-assigned id and timestamp.
    pub message: ChatMessage,
}

/// Moderation report acknowledgement.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    /// ID of the recorded report.
    pub report_id: i64,
}
