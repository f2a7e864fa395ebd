//! # REST API for Notifications
//!
//! Listing lives under `/api/patients/:id/notifications`; this router
//! handles the per-notification actions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, post},
    Router,
};
use tracing::{error, info};

use crate::io::rest::mappers::NotificationMapper;
use crate::io::rest::{error_response, Actor};
use crate::AppState;
use shared::MessageResponse;

/// Create a router for notification related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id", delete(delete_notification))
        .route("/:id/read", post(mark_notification_read))
}

/// Delete a notification
pub async fn delete_notification(
    State(state): State<AppState>,
    Actor(principal): Actor,
    Path(notification_id): Path<i64>,
) -> impl IntoResponse {
    info!("DELETE /api/notifications/{} - actor: {}", notification_id, principal);

    match state.notification_service.delete(&principal, notification_id).await {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("Notification deleted successfully"))).into_response(),
        Err(e) => {
            error!("Failed to delete notification: {}", e);
            error_response(e)
        }
    }
}

/// Mark a notification as read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Actor(principal): Actor,
    Path(notification_id): Path<i64>,
) -> impl IntoResponse {
    info!("POST /api/notifications/{}/read - actor: {}", notification_id, principal);

    match state.notification_service.mark_read(&principal, notification_id).await {
        Ok(notification) => (StatusCode::OK, Json(NotificationMapper::to_dto(notification))).into_response(),
        Err(e) => {
            error!("Failed to mark notification as read: {}", e);
            error_response(e)
        }
    }
}
