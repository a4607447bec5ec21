//! API handlers for the Web API.

pub mod messages;

pub use messages::*;

use std::sync::Arc;

use crate::chat::ChatGateway;

/// Shared application state for HTTP handlers.
pub struct AppState {
    /// Chat gateway, the single publish path for both ingress routes.
    pub gateway: Arc<ChatGateway>,
}

impl AppState {
    /// Create new application state.
    pub fn new(gateway: Arc<ChatGateway>) -> Self {
        Self { gateway }
    }
}
