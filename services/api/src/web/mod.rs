//! services/api/src/web/mod.rs
//!
//! Axum handlers, the shared application state, and the master OpenAPI
//! definition.

use axum::Json;
use serde_json::json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub mod auth;
pub mod bookings;
pub mod dispatch;
pub mod middleware;
pub mod notifications;
pub mod providers;
pub mod respond;
pub mod reviews;
pub mod services;
pub mod state;
pub mod users;

pub use middleware::require_auth;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::google_callback_handler,
        users::me_handler,
        users::set_role_handler,
        services::list_services_handler,
        services::search_services_handler,
        services::get_service_handler,
        services::service_reviews_handler,
        services::create_service_handler,
        services::update_service_handler,
        services::delete_service_handler,
        bookings::create_booking_handler,
        bookings::list_bookings_handler,
        bookings::provider_bookings_handler,
        bookings::get_booking_handler,
        bookings::update_booking_status_handler,
        bookings::cancel_booking_handler,
        reviews::create_review_handler,
        reviews::my_reviews_handler,
        reviews::delete_review_handler,
        notifications::list_notifications_handler,
        notifications::unread_count_handler,
        notifications::create_notification_handler,
        notifications::mark_read_handler,
        notifications::mark_all_read_handler,
        notifications::delete_notification_handler,
        providers::create_provider_handler,
        providers::my_provider_handler,
        providers::provider_profile_handler,
        providers::update_provider_profile_handler,
        providers::provider_services_handler,
        providers::get_availability_handler,
        providers::update_availability_handler,
        providers::add_slot_handler,
        providers::delete_slot_handler,
        providers::add_holiday_handler,
        providers::delete_holiday_handler,
        providers::add_break_handler,
        providers::delete_break_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::GoogleCallbackRequest,
            users::UserPayload,
            users::SetRoleRequest,
            services::ServicePayload,
            services::CreateServiceRequest,
            services::UpdateServiceRequest,
            bookings::BookingPayload,
            bookings::CreateBookingRequest,
            bookings::UpdateStatusRequest,
            bookings::CancelBookingRequest,
            reviews::ReviewPayload,
            reviews::CreateReviewRequest,
            notifications::NotificationPayload,
            notifications::CreateNotificationRequest,
            providers::ProviderPayload,
            providers::CreateProviderRequest,
            providers::UpdateProviderRequest,
            providers::UpdateAvailabilityRequest,
            providers::AddSlotRequest,
            providers::DeleteSlotRequest,
            providers::AddHolidayRequest,
            providers::AddBreakRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "NearServe API", description = "Local-services marketplace API: providers, services, bookings, reviews, and notifications.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Root Endpoint Directory
//=========================================================================================

/// GET / - A small directory of the mounted endpoint groups.
pub async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": "NearServe API",
        "endpoints": {
            "auth": "/api/auth",
            "users": "/api/users",
            "services": "/api/services",
            "bookings": "/api/bookings",
            "reviews": "/api/reviews",
            "notifications": "/api/notifications",
            "providers": "/api/providers",
            "docs": "/swagger-ui"
        }
    }))
}
