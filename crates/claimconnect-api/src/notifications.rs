use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use claimconnect_types::api::{NotificationResponse, UnreadCountResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::util::{parse_db_timestamp, parse_db_uuid};

/// GET /api/notifications/{email} — all notifications for a recipient,
/// newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_notifications(&email))
        .await
        .map_err(ApiError::join_error)??;

    let notifications: Vec<NotificationResponse> = rows
        .into_iter()
        .map(|row| NotificationResponse {
            id: parse_db_uuid(&row.id, "notification"),
            user_email: row.user_email,
            kind: row.kind,
            message: row.message,
            is_read: row.is_read,
            created_at: parse_db_timestamp(&row.created_at, "notification"),
        })
        .collect();

    Ok(Json(notifications))
}

/// POST /api/notifications/{id}/read — idempotent: re-marking a read
/// notification succeeds and the flag stays set.
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let notification_id = id.to_string();
    let matched = tokio::task::spawn_blocking(move || {
        db.db.mark_notification_read(&notification_id)
    })
    .await
    .map_err(ApiError::join_error)??;

    if !matched {
        return Err(ApiError::not_found("Notification not found"));
    }

    Ok(Json(serde_json::json!({ "message": "Notification marked as read" })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let unread = tokio::task::spawn_blocking(move || db.db.count_unread(&email))
        .await
        .map_err(ApiError::join_error)??;

    Ok(Json(UnreadCountResponse { unread }))
}
