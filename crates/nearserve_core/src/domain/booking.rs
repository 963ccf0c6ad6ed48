//! crates/nearserve_core/src/domain/booking.rs
//!
//! The booking record and its status state machine.
//!
//! Provider-side updates and customer-side cancellation enforce different
//! guards on purpose: the provider is blocked once a booking is completed or
//! cancelled (but may still move a rejected booking), while the customer can
//! always bail out of anything that isn't completed or already cancelled.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The six booking states. `Completed`, `Cancelled` and `Rejected` have no
/// outgoing edges in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
        Self::Rejected,
    ];

    /// The directed edges of the state machine.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Rejected)
                | (Self::Confirmed, Self::InProgress)
                | (Self::Confirmed, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
        )
    }

    /// Whether a provider-side status update is blocked outright. Note the
    /// asymmetry: `Rejected` does not block here.
    pub fn blocks_provider_update(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the owning customer may no longer cancel. Any other state
    /// cancels unconditionally, bypassing the edge table above.
    pub fn blocks_customer_cancel(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| format!("'{value}' is not a valid status"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// Where the service is to be performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingAddress {
    pub street: Option<String>,
    pub city: String,
    pub state: Option<String>,
    #[serde(rename = "zipCode")]
    pub zip_code: Option<String>,
    pub landmark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingContact {
    pub phone: String,
    #[serde(rename = "alternatePhone")]
    pub alternate_phone: Option<String>,
}

/// A reservation of a service by a customer. The price is snapshotted from
/// the service at creation time and never re-read.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: Uuid,
    pub service_id: Uuid,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub scheduled_date: DateTime<Utc>,
    pub scheduled_time: String,
    pub status: BookingStatus,
    pub price: f64,
    pub payment_status: PaymentStatus,
    pub customer_notes: Option<String>,
    pub provider_notes: Option<String>,
    pub address: BookingAddress,
    pub contact: BookingContact,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Per-status booking counts for the provider dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BookingStatusCounts {
    pub pending: i64,
    pub confirmed: i64,
    #[serde(rename = "inProgress")]
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
}

/// Display time used when the customer omits one.
pub const DEFAULT_SCHEDULED_TIME: &str = "10:00 AM";

/// Notes placeholder for one-tap bookings with an empty form.
pub const DEFAULT_CUSTOMER_NOTES: &str = "Quick booking";

/// Reason recorded when the customer cancels without giving one.
pub const DEFAULT_CANCELLATION_REASON: &str = "Cancelled by user";

/// Default scheduled date when the customer omits one: tomorrow at 10:00.
pub fn default_scheduled_date(now: DateTime<Utc>) -> DateTime<Utc> {
    (now + Duration::days(1))
        .date_naive()
        .and_hms_opt(10, 0, 0)
        .expect("10:00:00 is a valid wall-clock time")
        .and_utc()
}

/// Default booking address derived from the service's city.
pub fn default_address(service_city: Option<&str>) -> BookingAddress {
    BookingAddress {
        street: Some("To be confirmed".to_string()),
        city: service_city.unwrap_or("Not specified").to_string(),
        state: None,
        zip_code: None,
        landmark: None,
    }
}

/// Default contact from the caller's on-file phone, or a placeholder.
pub fn default_contact(user_phone: Option<&str>) -> BookingContact {
    BookingContact {
        phone: user_phone.unwrap_or("To be confirmed").to_string(),
        alternate_phone: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn transition_table_matches_the_design() {
        use BookingStatus::*;
        let allowed = [
            (Pending, Confirmed),
            (Pending, Rejected),
            (Confirmed, InProgress),
            (Confirmed, Cancelled),
            (InProgress, Completed),
        ];
        for from in BookingStatus::ALL {
            for to in BookingStatus::ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_edges() {
        use BookingStatus::*;
        for terminal in [Completed, Cancelled, Rejected] {
            for to in BookingStatus::ALL {
                assert!(!terminal.can_transition_to(to));
            }
        }
    }

    #[test]
    fn provider_guard_does_not_block_rejected() {
        use BookingStatus::*;
        assert!(Completed.blocks_provider_update());
        assert!(Cancelled.blocks_provider_update());
        assert!(!Rejected.blocks_provider_update());
        assert!(!Pending.blocks_provider_update());
        assert!(!InProgress.blocks_provider_update());
    }

    #[test]
    fn customer_can_cancel_anything_not_finished() {
        use BookingStatus::*;
        assert!(Completed.blocks_customer_cancel());
        assert!(Cancelled.blocks_customer_cancel());
        // Permissive by design: even in-progress and rejected bookings
        // can be cancelled by the customer.
        assert!(!InProgress.blocks_customer_cancel());
        assert!(!Rejected.blocks_customer_cancel());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in BookingStatus::ALL {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("done".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn default_date_is_tomorrow_at_ten() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 18, 45, 12).unwrap();
        let scheduled = default_scheduled_date(now);
        assert_eq!(scheduled, Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap());
    }

    #[test]
    fn default_address_and_contact_fill_placeholders() {
        let address = default_address(Some("Pune"));
        assert_eq!(address.city, "Pune");
        assert_eq!(address.street.as_deref(), Some("To be confirmed"));

        let address = default_address(None);
        assert_eq!(address.city, "Not specified");

        assert_eq!(default_contact(Some("+91-98765")).phone, "+91-98765");
        assert_eq!(default_contact(None).phone, "To be confirmed");
    }
}
