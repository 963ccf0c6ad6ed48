//! services/api/src/web/reviews.rs
//!
//! Review creation, the caller's review list, and deletion. Creation and
//! deletion both trigger a full recompute of the service and provider
//! rating aggregates from the surviving review set.

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
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::dispatch;
use crate::web::middleware::AuthUser;
use crate::web::respond::{message, ApiResult};
use crate::web::state::AppState;
use nearserve_core::domain::review::is_valid_rating;
use nearserve_core::domain::{NotificationType, Priority, RelatedRef, Review};
use nearserve_core::page::Page;
use nearserve_core::ports::{NewNotification, NewReview, PortError};
use nearserve_core::rating::Rating;
use nearserve_core::BookingStatus;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ReviewPayload {
    pub id: Uuid,
    #[serde(rename = "bookingId")]
    pub booking_id: Uuid,
    #[serde(rename = "serviceId")]
    pub service_id: Uuid,
    #[serde(rename = "providerId")]
    pub provider_id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: String,
    pub images: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewPayload {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            booking_id: review.booking_id,
            service_id: review.service_id,
            provider_id: review.provider_id,
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment,
            images: review.images,
            created_at: review.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    #[serde(rename = "bookingId")]
    pub booking_id: Uuid,
    #[serde(rename = "serviceId")]
    pub service_id: Uuid,
    pub rating: i16,
    pub comment: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct MyReviewsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Recomputes both rating aggregates from the current review sets.
async fn recompute_aggregates(
    state: &AppState,
    service_id: Uuid,
    provider_id: Uuid,
) -> Result<(), PortError> {
    let service_ratings = state.store.service_ratings(service_id).await?;
    state
        .store
        .set_service_rating(service_id, Rating::from_ratings(&service_ratings))
        .await?;

    let provider_ratings = state.store.provider_ratings(provider_id).await?;
    state
        .store
        .set_provider_rating(provider_id, Rating::from_ratings(&provider_ratings))
        .await?;
    Ok(())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /reviews - Review a completed booking
#[utoipa::path(
    post,
    path = "/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ReviewPayload),
        (status = 400, description = "Invalid rating, booking not completed, or service mismatch"),
        (status = 403, description = "Not the booking's customer"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking already reviewed")
    ),
    security(("bearer" = []))
)]
pub async fn create_review_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.comment.is_empty() {
        return Err(PortError::Validation(
            "Booking ID, service ID, rating, and comment are required".to_string(),
        )
        .into());
    }
    if !is_valid_rating(req.rating) {
        return Err(PortError::Validation("Rating must be between 1 and 5".to_string()).into());
    }

    let booking = state.store.get_booking(req.booking_id).await?;
    if booking.user_id != auth.id {
        return Err(
            PortError::Forbidden("Not authorized to review this booking".to_string()).into(),
        );
    }
    if booking.status != BookingStatus::Completed {
        return Err(
            PortError::Validation("Can only review completed bookings".to_string()).into(),
        );
    }
    if booking.service_id != req.service_id {
        return Err(
            PortError::Validation("Service ID does not match the booking".to_string()).into(),
        );
    }
    if state
        .store
        .find_review_by_booking(req.booking_id)
        .await?
        .is_some()
    {
        return Err(
            PortError::Conflict("Review already exists for this booking".to_string()).into(),
        );
    }

    // The unique index on booking_id turns a concurrent double-submit into
    // a Conflict here rather than a second row.
    let review = state
        .store
        .create_review(NewReview {
            booking_id: req.booking_id,
            service_id: req.service_id,
            provider_id: booking.provider_id,
            user_id: auth.id,
            rating: req.rating,
            comment: req.comment,
            images: req.images,
        })
        .await?;

    recompute_aggregates(&state, review.service_id, review.provider_id).await?;

    let provider = state.store.get_provider(review.provider_id).await?;
    let reviewer = state.store.get_user(auth.id).await?;
    dispatch::best_effort(
        state.store.as_ref(),
        NewNotification {
            user_id: provider.user_id,
            kind: NotificationType::ReviewReceived,
            title: "New Review Received".to_string(),
            message: format!(
                "You received a {}-star review from {}",
                review.rating, reviewer.name
            ),
            related: Some(RelatedRef::Review(review.id)),
            priority: Priority::Medium,
            expires_at: None,
        },
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Review created successfully",
            "data": ReviewPayload::from(review),
        })),
    ))
}

/// GET /reviews/my-reviews - The caller's reviews, newest first
#[utoipa::path(
    get,
    path = "/reviews/my-reviews",
    params(
        ("page" = Option<i64>, Query, description = "Page number, 1-based"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses((status = 200, description = "Review page", body = Vec<ReviewPayload>)),
    security(("bearer" = []))
)]
pub async fn my_reviews_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<MyReviewsQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let (reviews, total) = state.store.list_user_reviews(auth.id, page, limit).await?;
    let payload: Vec<ReviewPayload> = reviews.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "data": payload,
        "pagination": Page::new(total, page, limit),
    })))
}

/// DELETE /reviews/{id} - Delete an owned review
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    params(("id" = Uuid, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Review not found")
    ),
    security(("bearer" = []))
)]
pub async fn delete_review_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(review_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let review = state.store.get_review(review_id).await?;
    if review.user_id != auth.id {
        return Err(
            PortError::Forbidden("Not authorized to delete this review".to_string()).into(),
        );
    }

    state.store.delete_review(review_id).await?;
    recompute_aggregates(&state, review.service_id, review.provider_id).await?;

    Ok(message("Review deleted successfully"))
}
