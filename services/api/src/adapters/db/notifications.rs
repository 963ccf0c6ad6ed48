//! services/api/src/adapters/db/notifications.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nearserve_core::domain::{Notification, NotificationType, Priority, RelatedRef};
use nearserve_core::page::Page;
use nearserve_core::ports::{NewNotification, NotificationStore, PortError, PortResult};
use sqlx::FromRow;
use uuid::Uuid;

use super::{enum_from_str, enum_to_str, unexpected, DbAdapter};

#[derive(FromRow)]
struct NotificationRecord {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    title: String,
    message: String,
    related_model: Option<String>,
    related_id: Option<Uuid>,
    priority: String,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl NotificationRecord {
    fn to_domain(self) -> PortResult<Notification> {
        let related = match (self.related_model.as_deref(), self.related_id) {
            (Some(model), Some(id)) => Some(related_from_columns(model, id)?),
            _ => None,
        };
        Ok(Notification {
            id: self.id,
            user_id: self.user_id,
            kind: enum_from_str::<NotificationType>(&self.kind)?,
            title: self.title,
            message: self.message,
            related,
            priority: enum_from_str::<Priority>(&self.priority)?,
            is_read: self.is_read,
            read_at: self.read_at,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

fn related_from_columns(model: &str, id: Uuid) -> PortResult<RelatedRef> {
    match model {
        "Booking" => Ok(RelatedRef::Booking(id)),
        "Service" => Ok(RelatedRef::Service(id)),
        "Review" => Ok(RelatedRef::Review(id)),
        "Provider" => Ok(RelatedRef::Provider(id)),
        "User" => Ok(RelatedRef::User(id)),
        other => Err(PortError::Unexpected(format!(
            "unrecognized related model '{other}'"
        ))),
    }
}

fn related_to_columns(related: Option<RelatedRef>) -> (Option<&'static str>, Option<Uuid>) {
    match related {
        Some(RelatedRef::Booking(id)) => (Some("Booking"), Some(id)),
        Some(RelatedRef::Service(id)) => (Some("Service"), Some(id)),
        Some(RelatedRef::Review(id)) => (Some("Review"), Some(id)),
        Some(RelatedRef::Provider(id)) => (Some("Provider"), Some(id)),
        Some(RelatedRef::User(id)) => (Some("User"), Some(id)),
        None => (None, None),
    }
}

// `type` is a keyword-adjacent column name; it is aliased to `kind` on the
// way out to match the record struct.
const NOTIFICATION_COLUMNS: &str = "id, user_id, type AS kind, title, message, related_model, \
     related_id, priority, is_read, read_at, expires_at, created_at";

/// Live-row predicate shared by every read path; expired rows stay in the
/// table until swept but are never served.
const NOT_EXPIRED: &str = "(expires_at IS NULL OR expires_at > now())";

#[async_trait]
impl NotificationStore for DbAdapter {
    async fn create_notification(&self, new: NewNotification) -> PortResult<Notification> {
        let (related_model, related_id) = related_to_columns(new.related);
        let record = sqlx::query_as::<_, NotificationRecord>(&format!(
            "INSERT INTO notifications
                 (user_id, type, title, message, related_model, related_id,
                  priority, expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(new.user_id)
        .bind(enum_to_str(&new.kind))
        .bind(&new.title)
        .bind(&new.message)
        .bind(related_model)
        .bind(related_id)
        .bind(enum_to_str(&new.priority))
        .bind(new.expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: i64,
        limit: i64,
    ) -> PortResult<(Vec<Notification>, i64)> {
        let read_clause = if unread_only { " AND is_read = FALSE" } else { "" };

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM notifications
             WHERE user_id = $1 AND {NOT_EXPIRED}{read_clause}"
        ))
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(unexpected)?;

        let records = sqlx::query_as::<_, NotificationRecord>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE user_id = $1 AND {NOT_EXPIRED}{read_clause}
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(Page::offset(page, limit))
        .fetch_all(self.pool())
        .await
        .map_err(unexpected)?;
        let notifications = records
            .into_iter()
            .map(NotificationRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok((notifications, total))
    }

    async fn get_notification(&self, notification_id: Uuid) -> PortResult<Notification> {
        let record = sqlx::query_as::<_, NotificationRecord>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(notification_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound("Notification not found".to_string())
            }
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn unread_count(&self, user_id: Uuid) -> PortResult<i64> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM notifications
             WHERE user_id = $1 AND is_read = FALSE AND {NOT_EXPIRED}"
        ))
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(unexpected)
    }

    async fn mark_read(&self, notification_id: Uuid) -> PortResult<Notification> {
        let record = sqlx::query_as::<_, NotificationRecord>(&format!(
            "UPDATE notifications SET is_read = TRUE, read_at = now()
             WHERE id = $1
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(notification_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound("Notification not found".to_string())
            }
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn mark_all_read(&self, user_id: Uuid) -> PortResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = now()
             WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(self.pool())
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, notification_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(notification_id)
            .execute(self.pool())
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("Notification not found".to_string()));
        }
        Ok(())
    }
}
