//! Chat message handlers for the Web API fallback path.
//!
//! These endpoints mirror the WebSocket protocol for clients without a
//! persistent connection. Posting goes through the same gateway publish as
//! the WebSocket path, so connected participants still receive the message.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::chat::DEFAULT_HISTORY_LIMIT;
use crate::web::dto::{
    HistoryQuery, MessageResponse, MessagesResponse, PostMessageRequest, ReportMessageRequest,
    ReportResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, OptionalAuthUser};

/// Upper bound on a single history read.
const MAX_HISTORY_LIMIT: usize = 200;

/// GET /api/rooms/:book_id/messages - Read room history.
///
/// Reading is open to anonymous callers; only posting requires identity.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(_auth): OptionalAuthUser,
    Path(book_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);

    let messages = state.gateway.recent(book_id, limit).await?;

    Ok(Json(MessagesResponse { messages }))
}

/// POST /api/rooms/:book_id/messages - Post a message via the fallback path.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(book_id): Path<i64>,
    Json(req): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let identity = auth.identity();
    let message = state.gateway.publish(book_id, &identity, &req.body).await?;

    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

/// POST /api/messages/:message_id/report - Report a message for moderation.
pub async fn report_message(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(message_id): Path<i64>,
    Json(req): Json<ReportMessageRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    req.validate().map_err(ApiError::from_validation_errors)?;

    let report = state
        .gateway
        .report(message_id, auth.0.sub, &req.reason)
        .await?;

    Ok(Json(ReportResponse {
        report_id: report.id,
    }))
}
