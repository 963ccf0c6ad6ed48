//! crates/nearserve_core/src/ports.rs
//!
//! Service contracts (traits) for the application's core logic. These form
//! the boundary of the hexagonal architecture: the web handlers talk to
//! these traits and never to a concrete database or HTTP client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AvailabilityOverlay, Booking, BookingAddress, BookingContact, BookingStatus,
    BookingStatusCounts, Certification, ContactInfo, Experience, Notification, NotificationType,
    Priority, Provider, ProviderAddress, RelatedRef, Review, Service, ServiceCategory,
    ServiceLocation, User, UserCredentials, UserRole,
};
use crate::domain::service::PriceType;
use crate::rating::Rating;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations, shaped after the HTTP error
/// taxonomy the handlers map it to.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Missing or malformed input, enum mismatch, invalid id format.
    #[error("{0}")]
    Validation(String),
    /// Missing, invalid or expired credential.
    #[error("{0}")]
    Unauthorized(String),
    /// Valid caller, wrong owner or role.
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// Duplicate review, duplicate holiday, already-existing profile.
    #[error("{0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A deferred edit to a provider's availability overlay, applied by the
/// store while it holds the row's write lock.
pub type AvailabilityMutation =
    Box<dyn FnOnce(&mut AvailabilityOverlay) -> PortResult<()> + Send>;

//=========================================================================================
// New-record inputs
//=========================================================================================

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub hashed_password: Option<String>,
    pub google_id: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProvider {
    pub user_id: Uuid,
    pub business_name: Option<String>,
    pub bio: Option<String>,
    pub contact_info: ContactInfo,
    pub address: ProviderAddress,
    pub categories: Vec<ServiceCategory>,
    pub experience: Option<Experience>,
    pub certifications: Vec<Certification>,
}

/// Partial profile update; only the populated fields are written.
#[derive(Debug, Clone, Default)]
pub struct ProviderProfileUpdate {
    pub business_name: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub contact_info: Option<ContactInfo>,
    pub address: Option<ProviderAddress>,
    pub categories: Option<Vec<ServiceCategory>>,
    pub experience: Option<Experience>,
    pub certifications: Option<Vec<Certification>>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub provider_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ServiceCategory,
    pub price: f64,
    pub price_type: PriceType,
    pub location: ServiceLocation,
    pub images: Vec<String>,
    pub service_area_km: i32,
}

/// Partial service update limited to the owner-editable fields.
#[derive(Debug, Clone, Default)]
pub struct ServiceUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<ServiceCategory>,
    pub price: Option<f64>,
    pub price_type: Option<PriceType>,
    pub location: Option<ServiceLocation>,
    pub images: Option<Vec<String>>,
    pub service_area_km: Option<i32>,
    pub availability: Option<bool>,
    pub is_active: Option<bool>,
}

/// List-endpoint filters for the public catalog.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub category: Option<ServiceCategory>,
    pub city: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<f64>,
    pub availability: Option<bool>,
    pub search: Option<String>,
}

/// Search-endpoint filters; lat/lng describe a bounding box precomputed by
/// the caller from a radius in kilometres.
#[derive(Debug, Clone, Default)]
pub struct ServiceSearch {
    pub text: Option<String>,
    pub category: Option<ServiceCategory>,
    pub city: Option<String>,
    pub lat_range: Option<(f64, f64)>,
    pub lng_range: Option<(f64, f64)>,
}

/// Whitelisted sort columns for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    CreatedAt,
    Price,
    Rating,
    ScheduledDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub service_id: Uuid,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub scheduled_date: DateTime<Utc>,
    pub scheduled_time: String,
    pub price: f64,
    pub customer_notes: String,
    pub address: BookingAddress,
    pub contact: BookingContact,
}

/// Partial booking update applied by the status endpoints.
#[derive(Debug, Clone, Default)]
pub struct BookingUpdate {
    pub status: Option<BookingStatus>,
    pub provider_notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub booking_id: Uuid,
    pub service_id: Uuid,
    pub provider_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related: Option<RelatedRef>,
    pub priority: Priority,
    pub expires_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates a user; a duplicate email yields `PortError::Conflict`.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;
    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;
    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>>;
    async fn find_credentials_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;
    async fn set_user_role(&self, user_id: Uuid, role: UserRole) -> PortResult<User>;
    /// Links a Google subject id (and avatar, if the user has none) to an
    /// existing account.
    async fn link_google_account(
        &self,
        user_id: Uuid,
        google_id: &str,
        avatar: Option<&str>,
    ) -> PortResult<()>;
}

#[async_trait]
pub trait ProviderStore: Send + Sync {
    /// Creates a provider profile; a second profile for the same user yields
    /// `PortError::Conflict`.
    async fn create_provider(&self, new_provider: NewProvider) -> PortResult<Provider>;
    async fn get_provider(&self, provider_id: Uuid) -> PortResult<Provider>;
    async fn find_provider_by_user(&self, user_id: Uuid) -> PortResult<Option<Provider>>;
    async fn update_provider_profile(
        &self,
        provider_id: Uuid,
        update: ProviderProfileUpdate,
    ) -> PortResult<Provider>;
    /// Applies an edit to the availability overlay atomically: the overlay
    /// is read, mutated, and written back with no interleaved writer, so
    /// duplicate checks inside the edit see the latest state. Returns the
    /// overlay as persisted.
    async fn mutate_availability(
        &self,
        provider_id: Uuid,
        apply: AvailabilityMutation,
    ) -> PortResult<AvailabilityOverlay>;
    async fn increment_completed_bookings(&self, provider_id: Uuid) -> PortResult<()>;
    async fn increment_cancelled_bookings(&self, provider_id: Uuid) -> PortResult<()>;
    async fn set_provider_rating(&self, provider_id: Uuid, rating: Rating) -> PortResult<()>;
}

#[async_trait]
pub trait ServiceStore: Send + Sync {
    async fn create_service(&self, new_service: NewService) -> PortResult<Service>;
    async fn get_service(&self, service_id: Uuid) -> PortResult<Service>;
    async fn update_service(
        &self,
        service_id: Uuid,
        update: ServiceUpdate,
    ) -> PortResult<Service>;
    async fn delete_service(&self, service_id: Uuid) -> PortResult<()>;
    async fn list_services(
        &self,
        filter: ServiceFilter,
        page: i64,
        limit: i64,
        sort_by: SortBy,
        sort_order: SortOrder,
    ) -> PortResult<(Vec<Service>, i64)>;
    /// Top matches for the search endpoint, best-rated first, capped by the
    /// caller.
    async fn search_services(&self, search: ServiceSearch, limit: i64)
        -> PortResult<Vec<Service>>;
    async fn list_provider_services(&self, provider_id: Uuid) -> PortResult<Vec<Service>>;
    async fn set_service_rating(&self, service_id: Uuid, rating: Rating) -> PortResult<()>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn create_booking(&self, new_booking: NewBooking) -> PortResult<Booking>;
    async fn get_booking(&self, booking_id: Uuid) -> PortResult<Booking>;
    async fn list_customer_bookings(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
        page: i64,
        limit: i64,
        sort_by: SortBy,
        sort_order: SortOrder,
    ) -> PortResult<(Vec<Booking>, i64)>;
    async fn list_provider_bookings(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
        page: i64,
        limit: i64,
        sort_by: SortBy,
        sort_order: SortOrder,
    ) -> PortResult<(Vec<Booking>, i64)>;
    async fn provider_status_counts(&self, provider_id: Uuid) -> PortResult<BookingStatusCounts>;
    async fn update_booking(
        &self,
        booking_id: Uuid,
        update: BookingUpdate,
    ) -> PortResult<Booking>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Creates a review; a second review for the same booking yields
    /// `PortError::Conflict` (backed by a unique index, so concurrent
    /// creations race safely).
    async fn create_review(&self, new_review: NewReview) -> PortResult<Review>;
    async fn get_review(&self, review_id: Uuid) -> PortResult<Review>;
    async fn find_review_by_booking(&self, booking_id: Uuid) -> PortResult<Option<Review>>;
    async fn delete_review(&self, review_id: Uuid) -> PortResult<()>;
    async fn list_service_reviews(
        &self,
        service_id: Uuid,
        page: i64,
        limit: i64,
    ) -> PortResult<(Vec<Review>, i64)>;
    async fn list_user_reviews(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> PortResult<(Vec<Review>, i64)>;
    /// All star values currently referencing a service, for aggregate
    /// recomputation and the histogram.
    async fn service_ratings(&self, service_id: Uuid) -> PortResult<Vec<i16>>;
    async fn provider_ratings(&self, provider_id: Uuid) -> PortResult<Vec<i16>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn create_notification(&self, new: NewNotification) -> PortResult<Notification>;
    /// Lists a user's notifications newest-first; expired rows are excluded.
    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: i64,
        limit: i64,
    ) -> PortResult<(Vec<Notification>, i64)>;
    async fn get_notification(&self, notification_id: Uuid) -> PortResult<Notification>;
    async fn unread_count(&self, user_id: Uuid) -> PortResult<i64>;
    async fn mark_read(&self, notification_id: Uuid) -> PortResult<Notification>;
    /// Marks the caller's unread set read; returns the number updated.
    async fn mark_all_read(&self, user_id: Uuid) -> PortResult<u64>;
    async fn delete_notification(&self, notification_id: Uuid) -> PortResult<()>;
}

/// The full persistence surface, as held by the application state.
pub trait Store:
    UserStore + ProviderStore + ServiceStore + BookingStore + ReviewStore + NotificationStore
{
}

impl<T> Store for T where
    T: UserStore + ProviderStore + ServiceStore + BookingStore + ReviewStore + NotificationStore
{
}

//=========================================================================================
// Identity-provider Port
//=========================================================================================

/// Profile returned by the external identity provider after a successful
/// code exchange.
#[derive(Debug, Clone)]
pub struct IdentityProfile {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// The external identity provider (Google). Constructed explicitly and
/// injected through the application state; no process-wide registration.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange_code(&self, code: &str) -> PortResult<IdentityProfile>;
}
