//! services/api/src/web/dispatch.rs
//!
//! Best-effort notification fan-out. A failed delivery is logged and
//! dropped; it never changes the outcome of the request that triggered it.

use nearserve_core::ports::{NewNotification, NotificationStore};
use tracing::warn;

/// Persists a notification, swallowing any failure.
pub async fn best_effort(store: &dyn NotificationStore, new: NewNotification) {
    let kind = new.kind;
    let user_id = new.user_id;
    if let Err(err) = store.create_notification(new).await {
        warn!("failed to deliver {kind:?} notification to user {user_id}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nearserve_core::domain::{Notification, NotificationType, Priority};
    use nearserve_core::ports::{PortError, PortResult};
    use std::sync::Mutex;
    use uuid::Uuid;

    struct RecordingSink {
        delivered: Mutex<Vec<NewNotification>>,
    }

    struct FailingSink;

    #[async_trait]
    impl NotificationStore for RecordingSink {
        async fn create_notification(&self, new: NewNotification) -> PortResult<Notification> {
            let notification = Notification {
                id: Uuid::new_v4(),
                user_id: new.user_id,
                kind: new.kind,
                title: new.title.clone(),
                message: new.message.clone(),
                related: new.related,
                priority: new.priority,
                is_read: false,
                read_at: None,
                expires_at: new.expires_at,
                created_at: chrono::Utc::now(),
            };
            self.delivered.lock().unwrap().push(new);
            Ok(notification)
        }

        async fn list_notifications(
            &self,
            _user_id: Uuid,
            _unread_only: bool,
            _page: i64,
            _limit: i64,
        ) -> PortResult<(Vec<Notification>, i64)> {
            Ok((Vec::new(), 0))
        }

        async fn get_notification(&self, _id: Uuid) -> PortResult<Notification> {
            Err(PortError::NotFound("not used".to_string()))
        }

        async fn unread_count(&self, _user_id: Uuid) -> PortResult<i64> {
            Ok(0)
        }

        async fn mark_read(&self, _id: Uuid) -> PortResult<Notification> {
            Err(PortError::NotFound("not used".to_string()))
        }

        async fn mark_all_read(&self, _user_id: Uuid) -> PortResult<u64> {
            Ok(0)
        }

        async fn delete_notification(&self, _id: Uuid) -> PortResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl NotificationStore for FailingSink {
        async fn create_notification(&self, _new: NewNotification) -> PortResult<Notification> {
            Err(PortError::Unexpected("sink is down".to_string()))
        }

        async fn list_notifications(
            &self,
            _user_id: Uuid,
            _unread_only: bool,
            _page: i64,
            _limit: i64,
        ) -> PortResult<(Vec<Notification>, i64)> {
            Ok((Vec::new(), 0))
        }

        async fn get_notification(&self, _id: Uuid) -> PortResult<Notification> {
            Err(PortError::NotFound("not used".to_string()))
        }

        async fn unread_count(&self, _user_id: Uuid) -> PortResult<i64> {
            Ok(0)
        }

        async fn mark_read(&self, _id: Uuid) -> PortResult<Notification> {
            Err(PortError::NotFound("not used".to_string()))
        }

        async fn mark_all_read(&self, _user_id: Uuid) -> PortResult<u64> {
            Ok(0)
        }

        async fn delete_notification(&self, _id: Uuid) -> PortResult<()> {
            Ok(())
        }
    }

    fn sample(user_id: Uuid) -> NewNotification {
        NewNotification {
            user_id,
            kind: NotificationType::BookingCreated,
            title: "New Booking".to_string(),
            message: "You have a new booking".to_string(),
            related: None,
            priority: Priority::High,
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn delivers_through_the_sink() {
        let sink = RecordingSink {
            delivered: Mutex::new(Vec::new()),
        };
        let user_id = Uuid::new_v4();
        best_effort(&sink, sample(user_id)).await;

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].user_id, user_id);
    }

    #[tokio::test]
    async fn a_failing_sink_is_swallowed() {
        best_effort(&FailingSink, sample(Uuid::new_v4())).await;
    }
}
