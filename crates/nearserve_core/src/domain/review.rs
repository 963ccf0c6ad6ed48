//! crates/nearserve_core/src/domain/review.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A review of a completed booking. Exactly one may exist per booking; the
/// store enforces this with a unique index on the booking id.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Valid star ratings are whole numbers from 1 to 5.
pub fn is_valid_rating(rating: i16) -> bool {
    (1..=5).contains(&rating)
}

#[cfg(test)]
mod tests {
    use super::is_valid_rating;

    #[test]
    fn rating_bounds() {
        assert!(!is_valid_rating(0));
        assert!(is_valid_rating(1));
        assert!(is_valid_rating(5));
        assert!(!is_valid_rating(6));
        assert!(!is_valid_rating(-1));
    }
}
