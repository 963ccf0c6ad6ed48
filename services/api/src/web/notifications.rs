//! services/api/src/web/notifications.rs
//!
//! In-app notification endpoints. Users read, mark and delete their own
//! notifications; creation is reserved for backend jobs holding the
//! system key.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::AuthUser;
use crate::web::respond::{message, ApiFailure, ApiResult};
use crate::web::state::AppState;
use nearserve_core::domain::{Notification, NotificationType, Priority, RelatedRef};
use nearserve_core::page::Page;
use nearserve_core::ports::{NewNotification, PortError};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct NotificationPayload {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub related: Option<RelatedRef>,
    #[schema(value_type = String)]
    pub priority: Priority,
    #[serde(rename = "isRead")]
    pub is_read: bool,
    #[serde(rename = "readAt", skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationPayload {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            related: notification.related,
            priority: notification.priority,
            is_read: notification.is_read,
            read_at: notification.read_at,
            expires_at: notification.expires_at,
            created_at: notification.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct NotificationListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "unreadOnly")]
    pub unread_only: Option<String>,
}

/// System-endpoint body. Unknown `type` values fail deserialization, which
/// keeps the tag set closed at the boundary.
#[derive(Deserialize, ToSchema)]
pub struct CreateNotificationRequest {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub related: Option<RelatedRef>,
    #[schema(value_type = Option<String>)]
    pub priority: Option<Priority>,
    #[serde(rename = "expiresAt")]
    pub expires_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Guards the system creation endpoint: the request must carry the
/// configured key in `x-system-key`.
fn check_system_key(state: &AppState, headers: &HeaderMap) -> Result<(), ApiFailure> {
    let expected = state.config.system_api_key.as_deref().ok_or_else(|| {
        PortError::Forbidden("System notifications are not enabled".to_string())
    })?;
    let presented = headers
        .get("x-system-key")
        .and_then(|value| value.to_str().ok());
    if presented != Some(expected) {
        return Err(PortError::Forbidden("Invalid system key".to_string()).into());
    }
    Ok(())
}

/// Loads a notification and rejects callers other than its recipient.
async fn owned_notification(
    state: &AppState,
    notification_id: Uuid,
    auth: &AuthUser,
    action: &str,
) -> Result<Notification, ApiFailure> {
    let notification = state.store.get_notification(notification_id).await?;
    if notification.user_id != auth.id {
        return Err(PortError::Forbidden(format!(
            "Not authorized to {action} this notification"
        ))
        .into());
    }
    Ok(notification)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /notifications - The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    params(
        ("page" = Option<i64>, Query, description = "Page number, 1-based"),
        ("limit" = Option<i64>, Query, description = "Page size, default 20"),
        ("unreadOnly" = Option<String>, Query, description = "\"true\" to hide read ones")
    ),
    responses((status = 200, description = "Notification page", body = Vec<NotificationPayload>)),
    security(("bearer" = []))
)]
pub async fn list_notifications_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<NotificationListQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let unread_only = query.unread_only.as_deref() == Some("true");

    let (notifications, total) = state
        .store
        .list_notifications(auth.id, unread_only, page, limit)
        .await?;
    let unread_count = state.store.unread_count(auth.id).await?;
    let payload: Vec<NotificationPayload> = notifications.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "count": payload.len(),
        "totalNotifications": total,
        "unreadCount": unread_count,
        "pagination": Page::new(total, page, limit),
        "notifications": payload,
    })))
}

/// GET /notifications/unread-count - Unread scalar for the badge
#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    responses((status = 200, description = "Unread count")),
    security(("bearer" = []))
)]
pub async fn unread_count_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let unread_count = state.store.unread_count(auth.id).await?;
    Ok(Json(json!({
        "success": true,
        "unreadCount": unread_count,
    })))
}

/// POST /notifications - System-side creation, gated by `x-system-key`
#[utoipa::path(
    post,
    path = "/notifications",
    request_body = CreateNotificationRequest,
    params(("x-system-key" = String, Header, description = "Shared system capability key")),
    responses(
        (status = 201, description = "Notification created", body = NotificationPayload),
        (status = 400, description = "Missing fields or unknown type"),
        (status = 403, description = "Missing or wrong system key")
    )
)]
pub async fn create_notification_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateNotificationRequest>,
) -> ApiResult<impl IntoResponse> {
    check_system_key(&state, &headers)?;

    if req.title.is_empty() || req.message.is_empty() {
        return Err(PortError::Validation(
            "User ID, type, title, and message are required".to_string(),
        )
        .into());
    }

    let notification = state
        .store
        .create_notification(NewNotification {
            user_id: req.user_id,
            kind: req.kind,
            title: req.title,
            message: req.message,
            related: req.related,
            priority: req.priority.unwrap_or(Priority::Medium),
            expires_at: req.expires_at,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Notification created successfully",
            "notification": NotificationPayload::from(notification),
        })),
    ))
}

/// PUT /notifications/{id}/read - Mark one notification read
#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked read", body = NotificationPayload),
        (status = 403, description = "Not the recipient"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer" = []))
)]
pub async fn mark_read_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    owned_notification(&state, notification_id, &auth, "update").await?;
    let notification = state.store.mark_read(notification_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Notification marked as read",
        "notification": NotificationPayload::from(notification),
    })))
}

/// PUT /notifications/read-all - Mark the caller's unread set read
#[utoipa::path(
    put,
    path = "/notifications/read-all",
    responses((status = 200, description = "All marked read")),
    security(("bearer" = []))
)]
pub async fn mark_all_read_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let updated = state.store.mark_all_read(auth.id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "All notifications marked as read",
        "modifiedCount": updated,
    })))
}

/// DELETE /notifications/{id} - Delete one owned notification
#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Not the recipient"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer" = []))
)]
pub async fn delete_notification_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    owned_notification(&state, notification_id, &auth, "delete").await?;
    state.store.delete_notification(notification_id).await?;
    Ok(message("Notification deleted successfully"))
}
