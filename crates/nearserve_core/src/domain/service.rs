//! crates/nearserve_core/src/domain/service.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rating::Rating;

/// The closed set of service categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Plumber,
    Electrician,
    Mechanic,
    Carpenter,
    Painter,
    Cleaner,
    Gardener,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceType {
    Hourly,
    Fixed,
    PerVisit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Where a service is offered. Only the city is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "zipCode", skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// A bookable offering owned by exactly one provider.
#[derive(Debug, Clone)]
pub struct Service {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    pub price: f64,
    pub price_type: PriceType,
    pub location: ServiceLocation,
    pub availability: bool,
    pub rating: Rating,
    pub images: Vec<String>,
    pub service_area_km: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
