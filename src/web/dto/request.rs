//! Request DTOs for the Web API.

use serde::Deserialize;
use validator::Validate;

/// Post a chat message via the fallback path.
///
/// The author is taken from the verified token, never from the body.
#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    /// Message body. Emptiness is checked by the message store so both
    /// ingress paths reject it identically; only the upper bound lives here.
    #[validate(length(max = 2000, message = "Message is too long"))]
    pub body: String,
}

/// Report a message for moderation review.
#[derive(Debug, Deserialize, Validate)]
pub struct ReportMessageRequest {
    /// Reason given by the reporter.
    #[validate(length(min = 1, max = 500, message = "Reason must be 1-500 characters"))]
    pub reason: String,
}

/// Query parameters for reading room history.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of messages to return.
    #[serde(default)]
    pub limit: Option<usize>,
}
