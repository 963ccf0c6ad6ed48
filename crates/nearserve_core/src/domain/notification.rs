//! crates/nearserve_core/src/domain/notification.rs
//!
//! In-app notifications created exclusively as server-side side effects
//! (or through the system endpoint); never user-authored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of event tags a notification may carry. Unknown tags are
/// rejected at the creation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    BookingCreated,
    BookingConfirmed,
    BookingCancelled,
    BookingCompleted,
    BookingRejected,
    BookingInProgress,
    ReviewReceived,
    PaymentReceived,
    PaymentPending,
    MessageReceived,
    ProfileUpdated,
    ServiceApproved,
    ServiceRejected,
    SystemAlert,
    Promotional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

/// A typed reference to the entity a notification is about. Serializes to
/// the `relatedModel` + `relatedId` pair the clients already consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "relatedModel", content = "relatedId")]
pub enum RelatedRef {
    Booking(Uuid),
    Service(Uuid),
    Review(Uuid),
    Provider(Uuid),
    User(Uuid),
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related: Option<RelatedRef>,
    pub priority: Priority,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn related_ref_keeps_the_original_wire_shape() {
        let related = RelatedRef::Booking(Uuid::nil());
        let json = serde_json::to_value(related).unwrap();
        assert_eq!(json["relatedModel"], "Booking");
        assert_eq!(json["relatedId"], Uuid::nil().to_string());
    }

    #[test]
    fn type_tags_use_snake_case() {
        let json = serde_json::to_value(NotificationType::BookingCreated).unwrap();
        assert_eq!(json, "booking_created");
        assert_eq!(
            serde_json::from_value::<NotificationType>(serde_json::json!("review_received"))
                .unwrap(),
            NotificationType::ReviewReceived
        );
        assert!(serde_json::from_value::<NotificationType>(serde_json::json!("bogus")).is_err());
    }
}
