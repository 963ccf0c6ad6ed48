//! crates/nearserve_core/src/domain/provider.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::availability::AvailabilityOverlay;
use super::service::Coordinates;
use crate::rating::Rating;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: String,
    #[serde(rename = "alternatePhone", skip_serializing_if = "Option::is_none")]
    pub alternate_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "zipCode", skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Aggregate booking counters, bumped by atomic per-column updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    #[serde(rename = "totalBookings")]
    pub total_bookings: i64,
    #[serde(rename = "completedBookings")]
    pub completed_bookings: i64,
    #[serde(rename = "cancelledBookings")]
    pub cancelled_bookings: i64,
}

/// The provider-side extension of a user: one per user, owned exclusively
/// by it. Carries the business profile, aggregates, and the availability
/// overlay as a document-style sub-record.
#[derive(Debug, Clone)]
pub struct Provider {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub contact_info: ContactInfo,
    pub address: ProviderAddress,
    pub categories: Vec<super::service::ServiceCategory>,
    pub experience: Option<Experience>,
    pub certifications: Vec<Certification>,
    pub rating: Rating,
    pub stats: ProviderStats,
    pub availability: AvailabilityOverlay,
    pub is_verified: bool,
    pub is_active: bool,
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
}
