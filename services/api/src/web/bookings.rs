//! services/api/src/web/bookings.rs
//!
//! The booking lifecycle: creation with auto-filled defaults, the customer
//! and provider listings, the provider-side status machine, and the
//! customer-side cancel. Status side effects (timestamps, provider
//! counters, notifications) follow the transition being applied.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::dispatch;
use crate::web::middleware::AuthUser;
use crate::web::respond::ApiResult;
use crate::web::state::AppState;
use nearserve_core::domain::booking::{
    default_address, default_contact, default_scheduled_date, DEFAULT_CANCELLATION_REASON,
    DEFAULT_CUSTOMER_NOTES, DEFAULT_SCHEDULED_TIME,
};
use nearserve_core::domain::{
    Booking, BookingAddress, BookingContact, BookingStatus, NotificationType, PaymentStatus,
    Priority, RelatedRef,
};
use nearserve_core::page::Page;
use nearserve_core::ports::{
    BookingUpdate, NewBooking, NewNotification, PortError, SortBy, SortOrder,
};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct BookingPayload {
    pub id: Uuid,
    #[serde(rename = "serviceId")]
    pub service_id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "providerId")]
    pub provider_id: Uuid,
    #[serde(rename = "scheduledDate")]
    pub scheduled_date: DateTime<Utc>,
    #[serde(rename = "scheduledTime")]
    pub scheduled_time: String,
    #[schema(value_type = String)]
    pub status: BookingStatus,
    pub price: f64,
    #[serde(rename = "paymentStatus")]
    #[schema(value_type = String)]
    pub payment_status: PaymentStatus,
    #[serde(rename = "customerNotes", skip_serializing_if = "Option::is_none")]
    pub customer_notes: Option<String>,
    #[serde(rename = "providerNotes", skip_serializing_if = "Option::is_none")]
    pub provider_notes: Option<String>,
    #[schema(value_type = Object)]
    pub address: BookingAddress,
    #[schema(value_type = Object)]
    pub contact: BookingContact,
    #[serde(rename = "cancellationReason", skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(rename = "completedAt", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "cancelledAt", skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingPayload {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            service_id: booking.service_id,
            user_id: booking.user_id,
            provider_id: booking.provider_id,
            scheduled_date: booking.scheduled_date,
            scheduled_time: booking.scheduled_time,
            status: booking.status,
            price: booking.price,
            payment_status: booking.payment_status,
            customer_notes: booking.customer_notes,
            provider_notes: booking.provider_notes,
            address: booking.address,
            contact: booking.contact,
            cancellation_reason: booking.cancellation_reason,
            completed_at: booking.completed_at,
            cancelled_at: booking.cancelled_at,
            created_at: booking.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    #[serde(rename = "serviceId")]
    pub service_id: Uuid,
    #[serde(rename = "scheduledDate")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(rename = "scheduledTime")]
    pub scheduled_time: Option<String>,
    #[schema(value_type = Object)]
    pub address: Option<BookingAddress>,
    #[schema(value_type = Object)]
    pub contact: Option<BookingContact>,
    #[serde(rename = "customerNotes")]
    pub customer_notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(rename = "providerNotes")]
    pub provider_notes: Option<String>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct CancelBookingRequest {
    #[serde(rename = "cancellationReason")]
    pub cancellation_reason: Option<String>,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn parse_status_filter(value: Option<&str>) -> Result<Option<BookingStatus>, PortError> {
    value
        .map(|raw| BookingStatus::from_str(raw).map_err(PortError::Validation))
        .transpose()
}

fn parse_sort(sort_by: Option<&str>, sort_order: Option<&str>) -> (SortBy, SortOrder) {
    let by = match sort_by {
        Some("scheduledDate") => SortBy::ScheduledDate,
        Some("price") => SortBy::Price,
        _ => SortBy::CreatedAt,
    };
    let order = match sort_order {
        Some("asc") => SortOrder::Asc,
        _ => SortOrder::Desc,
    };
    (by, order)
}

fn status_notification(status: BookingStatus, booking_id: Uuid, user_id: Uuid) -> Option<NewNotification> {
    let (kind, message) = match status {
        BookingStatus::Confirmed => (
            NotificationType::BookingConfirmed,
            "Your booking has been confirmed",
        ),
        BookingStatus::InProgress => (
            NotificationType::BookingInProgress,
            "Your service is now in progress",
        ),
        BookingStatus::Completed => (
            NotificationType::BookingCompleted,
            "Your booking has been completed",
        ),
        BookingStatus::Cancelled => (
            NotificationType::BookingCancelled,
            "Your booking has been cancelled",
        ),
        BookingStatus::Rejected => (
            NotificationType::BookingRejected,
            "Your booking request has been rejected",
        ),
        BookingStatus::Pending => return None,
    };
    let priority = match status {
        BookingStatus::Confirmed | BookingStatus::Completed => Priority::High,
        _ => Priority::Medium,
    };
    Some(NewNotification {
        user_id,
        kind,
        title: "Booking Update".to_string(),
        message: message.to_string(),
        related: Some(RelatedRef::Booking(booking_id)),
        priority,
        expires_at: None,
    })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /bookings - Create a booking with auto-filled defaults
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingPayload),
        (status = 400, description = "Service is inactive or unavailable"),
        (status = 404, description = "Service not found")
    ),
    security(("bearer" = []))
)]
pub async fn create_booking_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    let service = state.store.get_service(req.service_id).await?;
    if !service.is_active || !service.availability {
        return Err(
            PortError::Validation("Service is not available for booking".to_string()).into(),
        );
    }

    let customer = state.store.get_user(auth.id).await?;

    let booking = state
        .store
        .create_booking(NewBooking {
            service_id: service.id,
            user_id: auth.id,
            provider_id: service.provider_id,
            scheduled_date: req
                .scheduled_date
                .unwrap_or_else(|| default_scheduled_date(Utc::now())),
            scheduled_time: req
                .scheduled_time
                .unwrap_or_else(|| DEFAULT_SCHEDULED_TIME.to_string()),
            price: service.price,
            customer_notes: req
                .customer_notes
                .unwrap_or_else(|| DEFAULT_CUSTOMER_NOTES.to_string()),
            address: req
                .address
                .unwrap_or_else(|| default_address(Some(&service.location.city))),
            contact: req
                .contact
                .unwrap_or_else(|| default_contact(customer.phone.as_deref())),
        })
        .await?;

    let provider = state.store.get_provider(service.provider_id).await?;
    dispatch::best_effort(
        state.store.as_ref(),
        NewNotification {
            user_id: provider.user_id,
            kind: NotificationType::BookingCreated,
            title: "New Booking Request".to_string(),
            message: format!("You have a new booking request for {}", service.title),
            related: Some(RelatedRef::Booking(booking.id)),
            priority: Priority::High,
            expires_at: None,
        },
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Booking created successfully",
            "data": BookingPayload::from(booking),
        })),
    ))
}

/// GET /bookings - The caller's bookings
#[utoipa::path(
    get,
    path = "/bookings",
    params(
        ("status" = Option<String>, Query, description = "Status filter"),
        ("page" = Option<i64>, Query, description = "Page number, 1-based"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("sortBy" = Option<String>, Query, description = "createdAt | scheduledDate | price"),
        ("sortOrder" = Option<String>, Query, description = "asc | desc")
    ),
    responses((status = 200, description = "Booking page", body = Vec<BookingPayload>)),
    security(("bearer" = []))
)]
pub async fn list_bookings_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<BookingListQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = parse_status_filter(query.status.as_deref())?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let (sort_by, sort_order) = parse_sort(query.sort_by.as_deref(), query.sort_order.as_deref());

    let (bookings, total) = state
        .store
        .list_customer_bookings(auth.id, status, page, limit, sort_by, sort_order)
        .await?;
    let payload: Vec<BookingPayload> = bookings.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "data": payload,
        "pagination": Page::new(total, page, limit),
    })))
}

/// GET /bookings/provider/bookings - Bookings for the caller's provider side
#[utoipa::path(
    get,
    path = "/bookings/provider/bookings",
    params(
        ("status" = Option<String>, Query, description = "Status filter"),
        ("page" = Option<i64>, Query, description = "Page number, 1-based"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("sortBy" = Option<String>, Query, description = "createdAt | scheduledDate | price"),
        ("sortOrder" = Option<String>, Query, description = "asc | desc")
    ),
    responses(
        (status = 200, description = "Booking page with status counts"),
        (status = 403, description = "No provider profile")
    ),
    security(("bearer" = []))
)]
pub async fn provider_bookings_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<BookingListQuery>,
) -> ApiResult<impl IntoResponse> {
    let provider = state
        .store
        .find_provider_by_user(auth.id)
        .await?
        .ok_or_else(|| {
            PortError::Forbidden("Only providers can access this endpoint".to_string())
        })?;

    let status = parse_status_filter(query.status.as_deref())?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let (sort_by, sort_order) = parse_sort(query.sort_by.as_deref(), query.sort_order.as_deref());

    let (bookings, total) = state
        .store
        .list_provider_bookings(provider.id, status, page, limit, sort_by, sort_order)
        .await?;
    let stats = state.store.provider_status_counts(provider.id).await?;
    let payload: Vec<BookingPayload> = bookings.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "data": payload,
        "pagination": Page::new(total, page, limit),
        "stats": stats,
    })))
}

/// GET /bookings/{id} - One booking, visible to its customer or provider
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "The booking", body = BookingPayload),
        (status = 403, description = "Neither the customer nor the provider"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer" = []))
)]
pub async fn get_booking_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let booking = state.store.get_booking(booking_id).await?;

    let is_customer = booking.user_id == auth.id;
    let is_provider = match state.store.find_provider_by_user(auth.id).await? {
        Some(provider) => provider.id == booking.provider_id,
        None => false,
    };
    if !is_customer && !is_provider {
        return Err(PortError::Forbidden(
            "You are not authorized to view this booking".to_string(),
        )
        .into());
    }

    Ok(Json(json!({
        "success": true,
        "data": BookingPayload::from(booking),
    })))
}

/// PUT /bookings/{id}/status - Provider-side status update
#[utoipa::path(
    put,
    path = "/bookings/{id}/status",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = BookingPayload),
        (status = 400, description = "Unknown status or terminal booking"),
        (status = 403, description = "Not the booking's provider"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer" = []))
)]
pub async fn update_booking_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(booking_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let status = BookingStatus::from_str(&req.status).map_err(|_| {
        let names: Vec<&str> = BookingStatus::ALL.iter().map(|s| s.as_str()).collect();
        PortError::Validation(format!("Status must be one of: {}", names.join(", ")))
    })?;

    let booking = state.store.get_booking(booking_id).await?;

    let provider = state
        .store
        .find_provider_by_user(auth.id)
        .await?
        .ok_or_else(|| {
            PortError::Forbidden("Only providers can update booking status".to_string())
        })?;
    if booking.provider_id != provider.id {
        return Err(PortError::Forbidden(
            "You can only update bookings for your own services".to_string(),
        )
        .into());
    }

    if booking.status.blocks_provider_update() {
        return Err(PortError::Validation(format!(
            "Cannot update booking that is already {}",
            booking.status.as_str()
        ))
        .into());
    }

    let now = Utc::now();
    let mut update = BookingUpdate {
        status: Some(status),
        provider_notes: req.provider_notes,
        ..BookingUpdate::default()
    };
    if status == BookingStatus::Completed {
        update.completed_at = Some(now);
        state
            .store
            .increment_completed_bookings(provider.id)
            .await?;
    }
    if status == BookingStatus::Cancelled || status == BookingStatus::Rejected {
        update.cancelled_at = Some(now);
        if status == BookingStatus::Cancelled {
            state
                .store
                .increment_cancelled_bookings(provider.id)
                .await?;
        }
    }

    let updated = state.store.update_booking(booking_id, update).await?;

    if let Some(notification) = status_notification(status, booking_id, booking.user_id) {
        dispatch::best_effort(state.store.as_ref(), notification).await;
    }

    Ok(Json(json!({
        "success": true,
        "message": "Booking status updated successfully",
        "data": BookingPayload::from(updated),
    })))
}

/// DELETE /bookings/{id} - Customer-side cancel
#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = CancelBookingRequest,
    responses(
        (status = 200, description = "Booking cancelled", body = BookingPayload),
        (status = 400, description = "Completed or already cancelled"),
        (status = 403, description = "Not the booking's customer"),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer" = []))
)]
pub async fn cancel_booking_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(booking_id): Path<Uuid>,
    body: Option<Json<CancelBookingRequest>>,
) -> ApiResult<impl IntoResponse> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let booking = state.store.get_booking(booking_id).await?;

    if booking.user_id != auth.id {
        return Err(
            PortError::Forbidden("You can only cancel your own bookings".to_string()).into(),
        );
    }
    if booking.status == BookingStatus::Completed {
        return Err(
            PortError::Validation("Cannot cancel a completed booking".to_string()).into(),
        );
    }
    if booking.status == BookingStatus::Cancelled {
        return Err(PortError::Validation("Booking is already cancelled".to_string()).into());
    }

    let updated = state
        .store
        .update_booking(
            booking_id,
            BookingUpdate {
                status: Some(BookingStatus::Cancelled),
                cancellation_reason: Some(
                    req.cancellation_reason
                        .unwrap_or_else(|| DEFAULT_CANCELLATION_REASON.to_string()),
                ),
                cancelled_at: Some(Utc::now()),
                ..BookingUpdate::default()
            },
        )
        .await?;

    let provider = state.store.get_provider(booking.provider_id).await?;
    dispatch::best_effort(
        state.store.as_ref(),
        NewNotification {
            user_id: provider.user_id,
            kind: NotificationType::BookingCancelled,
            title: "Booking Cancelled".to_string(),
            message: "A customer has cancelled their booking".to_string(),
            related: Some(RelatedRef::Booking(booking_id)),
            priority: Priority::Medium,
            expires_at: None,
        },
    )
    .await;

    Ok(Json(json!({
        "success": true,
        "message": "Booking cancelled successfully",
        "data": BookingPayload::from(updated),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_accepts_wire_spellings() {
        assert_eq!(
            parse_status_filter(Some("in-progress")).unwrap(),
            Some(BookingStatus::InProgress)
        );
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert!(parse_status_filter(Some("nope")).is_err());
    }

    #[test]
    fn pending_never_notifies() {
        let id = Uuid::new_v4();
        assert!(status_notification(BookingStatus::Pending, id, id).is_none());
    }

    #[test]
    fn confirmation_and_completion_are_high_priority() {
        let id = Uuid::new_v4();
        for (status, expected) in [
            (BookingStatus::Confirmed, Priority::High),
            (BookingStatus::Completed, Priority::High),
            (BookingStatus::InProgress, Priority::Medium),
            (BookingStatus::Cancelled, Priority::Medium),
            (BookingStatus::Rejected, Priority::Medium),
        ] {
            let notification = status_notification(status, id, id).unwrap();
            assert_eq!(notification.priority, expected, "{status:?}");
        }
    }
}
