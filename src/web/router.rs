//! Router configuration for the Web API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::auth::TokenKeys;

use super::handlers::{list_messages, post_message, report_message, AppState};
use super::middleware::{create_cors_layer, jwt_auth};
use super::ws::{chat_ws_handler, ChatWsState};

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    ws_state: Arc<ChatWsState>,
    token_keys: Arc<TokenKeys>,
    cors_origins: &[String],
) -> Router {
    // Fallback request/response routes
    let room_routes = Router::new()
        .route(
            "/rooms/:book_id/messages",
            get(list_messages).post(post_message),
        )
        .route("/messages/:message_id/report", post(report_message))
        .with_state(app_state);

    // Persistent-connection route
    let ws_routes = Router::new()
        .route("/chat/ws", get(chat_ws_handler))
        .with_state(ws_state);

    let api_routes = room_routes.merge(ws_routes);

    // Clone token keys for the middleware closure
    let keys_for_middleware = token_keys.clone();

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(cors_origins))
            .layer(middleware::from_fn(move |req, next| {
                let keys = keys_for_middleware.clone();
                jwt_auth(keys, req, next)
            })),
    )
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
