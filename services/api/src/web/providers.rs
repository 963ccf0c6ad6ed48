//! services/api/src/web/providers.rs
//!
//! Provider profile management and the availability overlay endpoints.
//! Every availability mutation re-checks ownership before touching the
//! overlay, then persists the whole document back.

use axum::{
    extract::{Path, State},
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

use crate::web::middleware::AuthUser;
use crate::web::respond::{ApiFailure, ApiResult};
use crate::web::services::ServicePayload;
use crate::web::state::AppState;
use crate::web::users::UserPayload;
use nearserve_core::domain::availability::Weekday;
use nearserve_core::domain::{
    AvailabilityError, AvailabilityOverlay, Certification, ContactInfo, DayAvailability,
    Experience, Provider, ProviderAddress, ProviderStats, ServiceCategory,
};
use nearserve_core::ports::{AvailabilityMutation, NewProvider, PortError, ProviderProfileUpdate};
use nearserve_core::rating::Rating;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ProviderPayload {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "businessName", skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(rename = "profileImage", skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(rename = "coverImage", skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(rename = "contactInfo")]
    #[schema(value_type = Object)]
    pub contact_info: ContactInfo,
    #[schema(value_type = Object)]
    pub address: ProviderAddress,
    #[schema(value_type = Vec<String>)]
    pub categories: Vec<ServiceCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub experience: Option<Experience>,
    #[schema(value_type = Vec<Object>)]
    pub certifications: Vec<Certification>,
    #[schema(value_type = Object)]
    pub rating: Rating,
    #[schema(value_type = Object)]
    pub stats: ProviderStats,
    #[schema(value_type = Object)]
    pub availability: AvailabilityOverlay,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "isSuspended")]
    pub is_suspended: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Provider> for ProviderPayload {
    fn from(provider: Provider) -> Self {
        Self {
            id: provider.id,
            user_id: provider.user_id,
            business_name: provider.business_name,
            bio: provider.bio,
            profile_image: provider.profile_image,
            cover_image: provider.cover_image,
            contact_info: provider.contact_info,
            address: provider.address,
            categories: provider.categories,
            experience: provider.experience,
            certifications: provider.certifications,
            rating: provider.rating,
            stats: provider.stats,
            availability: provider.availability,
            is_verified: provider.is_verified,
            is_active: provider.is_active,
            is_suspended: provider.is_suspended,
            created_at: provider.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateProviderRequest {
    #[serde(rename = "businessName")]
    pub business_name: Option<String>,
    pub bio: Option<String>,
    #[serde(rename = "contactInfo")]
    #[schema(value_type = Object)]
    pub contact_info: ContactInfo,
    #[schema(value_type = Object)]
    pub address: ProviderAddress,
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub categories: Vec<ServiceCategory>,
    #[schema(value_type = Object)]
    pub experience: Option<Experience>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub certifications: Vec<Certification>,
}

#[derive(Deserialize, Default, ToSchema)]
pub struct UpdateProviderRequest {
    #[serde(rename = "businessName")]
    pub business_name: Option<String>,
    pub bio: Option<String>,
    #[serde(rename = "profileImage")]
    pub profile_image: Option<String>,
    #[serde(rename = "coverImage")]
    pub cover_image: Option<String>,
    #[serde(rename = "contactInfo")]
    #[schema(value_type = Object)]
    pub contact_info: Option<ContactInfo>,
    #[schema(value_type = Object)]
    pub address: Option<ProviderAddress>,
    #[schema(value_type = Vec<String>)]
    pub categories: Option<Vec<ServiceCategory>>,
    #[schema(value_type = Object)]
    pub experience: Option<Experience>,
    #[schema(value_type = Vec<Object>)]
    pub certifications: Option<Vec<Certification>>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAvailabilityRequest {
    #[serde(rename = "isAvailable")]
    pub is_available: Option<bool>,
    #[serde(rename = "weeklyAvailability")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub weekly: Option<Vec<DayAvailability>>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddSlotRequest {
    #[schema(value_type = String)]
    pub day: Weekday,
    pub start: String,
    pub end: String,
}

#[derive(Deserialize, ToSchema)]
pub struct DeleteSlotRequest {
    #[schema(value_type = String)]
    pub day: Weekday,
}

#[derive(Deserialize, ToSchema)]
pub struct AddHolidayRequest {
    pub date: String,
    pub reason: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AddBreakRequest {
    pub date: String,
    pub start: String,
    pub end: String,
    pub reason: Option<String>,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn availability_error(err: AvailabilityError) -> PortError {
    match err {
        AvailabilityError::DuplicateHoliday => {
            PortError::Conflict("Holiday already exists for this date".to_string())
        }
        other => PortError::Validation(other.to_string()),
    }
}

/// The add-holiday edit, deferred so the store can run it under the row
/// lock. The duplicate-date check therefore sees the latest overlay even
/// when two adds race.
fn holiday_mutation(date: String, reason: String) -> AvailabilityMutation {
    Box::new(move |overlay| {
        overlay
            .add_holiday(&date, &reason)
            .map(|_| ())
            .map_err(availability_error)
    })
}

/// Loads a provider and rejects callers other than its owner.
async fn owned_provider(
    state: &AppState,
    provider_id: Uuid,
    auth: &AuthUser,
) -> Result<Provider, ApiFailure> {
    let provider = state.store.get_provider(provider_id).await.map_err(|err| {
        ApiFailure(match err {
            PortError::NotFound(_) => PortError::NotFound("Provider not found".to_string()),
            other => other,
        })
    })?;
    if provider.user_id != auth.id {
        return Err(
            PortError::Forbidden("Not authorized to update this provider".to_string()).into(),
        );
    }
    Ok(provider)
}

fn availability_response(message: &str, overlay: &AvailabilityOverlay) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "message": message,
        "data": overlay,
    }))
}

//=========================================================================================
// Profile Handlers
//=========================================================================================

/// POST /providers - Create the caller's provider profile
#[utoipa::path(
    post,
    path = "/providers",
    request_body = CreateProviderRequest,
    responses(
        (status = 201, description = "Profile created", body = ProviderPayload),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Profile already exists")
    ),
    security(("bearer" = []))
)]
pub async fn create_provider_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateProviderRequest>,
) -> ApiResult<impl IntoResponse> {
    let provider = state
        .store
        .create_provider(NewProvider {
            user_id: auth.id,
            business_name: req.business_name,
            bio: req.bio,
            contact_info: req.contact_info,
            address: req.address,
            categories: req.categories,
            experience: req.experience,
            certifications: req.certifications,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Provider profile created successfully",
            "data": ProviderPayload::from(provider),
        })),
    ))
}

/// GET /providers/me - The caller's own provider profile
#[utoipa::path(
    get,
    path = "/providers/me",
    responses(
        (status = 200, description = "Own profile", body = ProviderPayload),
        (status = 404, description = "No profile yet")
    ),
    security(("bearer" = []))
)]
pub async fn my_provider_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let provider = state
        .store
        .find_provider_by_user(auth.id)
        .await?
        .ok_or_else(|| {
            PortError::NotFound(
                "Provider profile not found. Please create a provider profile first.".to_string(),
            )
        })?;
    Ok(Json(json!({
        "success": true,
        "data": ProviderPayload::from(provider),
    })))
}

/// GET /providers/profile - Profile joined with the owning user
#[utoipa::path(
    get,
    path = "/providers/profile",
    responses(
        (status = 200, description = "Profile with user", body = ProviderPayload),
        (status = 404, description = "No profile yet")
    ),
    security(("bearer" = []))
)]
pub async fn provider_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let provider = state
        .store
        .find_provider_by_user(auth.id)
        .await?
        .ok_or_else(|| PortError::NotFound("Provider profile not found".to_string()))?;
    let user = state.store.get_user(auth.id).await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "provider": ProviderPayload::from(provider),
            "user": UserPayload::from(user),
        },
    })))
}

/// PUT /providers/profile - Partial update of the allowed profile fields
#[utoipa::path(
    put,
    path = "/providers/profile",
    request_body = UpdateProviderRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProviderPayload),
        (status = 404, description = "No profile yet")
    ),
    security(("bearer" = []))
)]
pub async fn update_provider_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<UpdateProviderRequest>,
) -> ApiResult<impl IntoResponse> {
    let provider = state
        .store
        .find_provider_by_user(auth.id)
        .await?
        .ok_or_else(|| PortError::NotFound("Provider profile not found".to_string()))?;

    let updated = state
        .store
        .update_provider_profile(
            provider.id,
            ProviderProfileUpdate {
                business_name: req.business_name,
                bio: req.bio,
                profile_image: req.profile_image,
                cover_image: req.cover_image,
                contact_info: req.contact_info,
                address: req.address,
                categories: req.categories,
                experience: req.experience,
                certifications: req.certifications,
            },
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Provider profile updated successfully",
        "data": ProviderPayload::from(updated),
    })))
}

/// GET /providers/services - The caller's own service listings
#[utoipa::path(
    get,
    path = "/providers/services",
    responses(
        (status = 200, description = "Own services", body = Vec<ServicePayload>),
        (status = 404, description = "No profile yet")
    ),
    security(("bearer" = []))
)]
pub async fn provider_services_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let provider = state
        .store
        .find_provider_by_user(auth.id)
        .await?
        .ok_or_else(|| PortError::NotFound("Provider profile not found".to_string()))?;
    let services = state.store.list_provider_services(provider.id).await?;
    let payload: Vec<ServicePayload> = services.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "success": true, "data": payload })))
}

//=========================================================================================
// Availability Handlers
//=========================================================================================

/// GET /providers/{id}/availability - Public read of the overlay
#[utoipa::path(
    get,
    path = "/providers/{id}/availability",
    params(("id" = Uuid, Path, description = "Provider id")),
    responses(
        (status = 200, description = "The availability overlay"),
        (status = 404, description = "Provider not found")
    )
)]
pub async fn get_availability_handler(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let provider = state.store.get_provider(provider_id).await?;
    Ok(Json(json!({
        "success": true,
        "data": provider.availability,
    })))
}

/// PUT /providers/{id}/availability - Replace the weekly grid and/or flag
#[utoipa::path(
    put,
    path = "/providers/{id}/availability",
    params(("id" = Uuid, Path, description = "Provider id")),
    request_body = UpdateAvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer" = []))
)]
pub async fn update_availability_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(provider_id): Path<Uuid>,
    Json(req): Json<UpdateAvailabilityRequest>,
) -> ApiResult<impl IntoResponse> {
    owned_provider(&state, provider_id, &auth).await?;
    let UpdateAvailabilityRequest { is_available, weekly } = req;
    let overlay = state
        .store
        .mutate_availability(
            provider_id,
            Box::new(move |overlay| {
                if let Some(weekly) = weekly {
                    overlay.replace_weekly(weekly).map_err(availability_error)?;
                }
                if let Some(flag) = is_available {
                    overlay.is_available = flag;
                }
                Ok(())
            }),
        )
        .await?;
    Ok(availability_response("Availability updated successfully", &overlay))
}

/// POST /providers/{id}/availability/slot - Add a weekly time slot
#[utoipa::path(
    post,
    path = "/providers/{id}/availability/slot",
    params(("id" = Uuid, Path, description = "Provider id")),
    request_body = AddSlotRequest,
    responses(
        (status = 200, description = "Slot added"),
        (status = 400, description = "Invalid time"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer" = []))
)]
pub async fn add_slot_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(provider_id): Path<Uuid>,
    Json(req): Json<AddSlotRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.start.is_empty() || req.end.is_empty() {
        return Err(PortError::Validation(
            "Day, start time, and end time are required".to_string(),
        )
        .into());
    }
    owned_provider(&state, provider_id, &auth).await?;
    let AddSlotRequest { day, start, end } = req;
    let overlay = state
        .store
        .mutate_availability(
            provider_id,
            Box::new(move |overlay| {
                overlay
                    .add_slot(day, &start, &end)
                    .map(|_| ())
                    .map_err(availability_error)
            }),
        )
        .await?;
    Ok(availability_response("Time slot added successfully", &overlay))
}

/// DELETE /providers/{id}/availability/slot/{slotId} - Remove a slot
#[utoipa::path(
    delete,
    path = "/providers/{id}/availability/slot/{slotId}",
    params(
        ("id" = Uuid, Path, description = "Provider id"),
        ("slotId" = Uuid, Path, description = "Slot id")
    ),
    request_body = DeleteSlotRequest,
    responses(
        (status = 200, description = "Slot deleted"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer" = []))
)]
pub async fn delete_slot_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((provider_id, slot_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<DeleteSlotRequest>,
) -> ApiResult<impl IntoResponse> {
    owned_provider(&state, provider_id, &auth).await?;
    let day = req.day;
    let overlay = state
        .store
        .mutate_availability(
            provider_id,
            Box::new(move |overlay| {
                overlay.remove_slot(day, slot_id);
                Ok(())
            }),
        )
        .await?;
    Ok(availability_response("Time slot deleted successfully", &overlay))
}

/// POST /providers/{id}/availability/holiday - Add a holiday
#[utoipa::path(
    post,
    path = "/providers/{id}/availability/holiday",
    params(("id" = Uuid, Path, description = "Provider id")),
    request_body = AddHolidayRequest,
    responses(
        (status = 200, description = "Holiday added"),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Duplicate date")
    ),
    security(("bearer" = []))
)]
pub async fn add_holiday_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(provider_id): Path<Uuid>,
    Json(req): Json<AddHolidayRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.date.is_empty() || req.reason.is_empty() {
        return Err(PortError::Validation("Date and reason are required".to_string()).into());
    }
    owned_provider(&state, provider_id, &auth).await?;
    let overlay = state
        .store
        .mutate_availability(provider_id, holiday_mutation(req.date, req.reason))
        .await?;
    Ok(availability_response("Holiday added successfully", &overlay))
}

/// DELETE /providers/{id}/availability/holiday/{holidayId} - Remove a holiday
#[utoipa::path(
    delete,
    path = "/providers/{id}/availability/holiday/{holidayId}",
    params(
        ("id" = Uuid, Path, description = "Provider id"),
        ("holidayId" = Uuid, Path, description = "Holiday id")
    ),
    responses(
        (status = 200, description = "Holiday deleted"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer" = []))
)]
pub async fn delete_holiday_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((provider_id, holiday_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    owned_provider(&state, provider_id, &auth).await?;
    let overlay = state
        .store
        .mutate_availability(
            provider_id,
            Box::new(move |overlay| {
                overlay.remove_holiday(holiday_id);
                Ok(())
            }),
        )
        .await?;
    Ok(availability_response("Holiday deleted successfully", &overlay))
}

/// POST /providers/{id}/availability/break - Add a dated break
#[utoipa::path(
    post,
    path = "/providers/{id}/availability/break",
    params(("id" = Uuid, Path, description = "Provider id")),
    request_body = AddBreakRequest,
    responses(
        (status = 200, description = "Break added"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer" = []))
)]
pub async fn add_break_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(provider_id): Path<Uuid>,
    Json(req): Json<AddBreakRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.date.is_empty() || req.start.is_empty() || req.end.is_empty() {
        return Err(PortError::Validation(
            "Date, start time, and end time are required".to_string(),
        )
        .into());
    }
    owned_provider(&state, provider_id, &auth).await?;
    let AddBreakRequest { date, start, end, reason } = req;
    let overlay = state
        .store
        .mutate_availability(
            provider_id,
            Box::new(move |overlay| {
                overlay
                    .add_break(&date, &start, &end, reason)
                    .map(|_| ())
                    .map_err(availability_error)
            }),
        )
        .await?;
    Ok(availability_response("Break added successfully", &overlay))
}

/// DELETE /providers/{id}/availability/break/{breakId} - Remove a break
#[utoipa::path(
    delete,
    path = "/providers/{id}/availability/break/{breakId}",
    params(
        ("id" = Uuid, Path, description = "Provider id"),
        ("breakId" = Uuid, Path, description = "Break id")
    ),
    responses(
        (status = 200, description = "Break deleted"),
        (status = 403, description = "Not the owner")
    ),
    security(("bearer" = []))
)]
pub async fn delete_break_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path((provider_id, break_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    owned_provider(&state, provider_id, &auth).await?;
    let overlay = state
        .store
        .mutate_availability(
            provider_id,
            Box::new(move |overlay| {
                overlay.remove_break(break_id);
                Ok(())
            }),
        )
        .await?;
    Ok(availability_response("Break deleted successfully", &overlay))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nearserve_core::ports::{PortResult, ProviderStore};
    use std::sync::Mutex;

    /// Applies mutations against one shared overlay, the way the database
    /// adapter applies them under the row lock.
    struct OverlayStore {
        overlay: Mutex<AvailabilityOverlay>,
    }

    impl OverlayStore {
        fn new() -> Self {
            Self {
                overlay: Mutex::new(AvailabilityOverlay::default()),
            }
        }
    }

    #[async_trait]
    impl ProviderStore for OverlayStore {
        async fn create_provider(&self, _new: NewProvider) -> PortResult<Provider> {
            unimplemented!()
        }

        async fn get_provider(&self, _id: Uuid) -> PortResult<Provider> {
            unimplemented!()
        }

        async fn find_provider_by_user(&self, _user: Uuid) -> PortResult<Option<Provider>> {
            unimplemented!()
        }

        async fn update_provider_profile(
            &self,
            _id: Uuid,
            _update: ProviderProfileUpdate,
        ) -> PortResult<Provider> {
            unimplemented!()
        }

        async fn mutate_availability(
            &self,
            _id: Uuid,
            apply: AvailabilityMutation,
        ) -> PortResult<AvailabilityOverlay> {
            let mut overlay = self.overlay.lock().unwrap();
            apply(&mut overlay)?;
            Ok(overlay.clone())
        }

        async fn increment_completed_bookings(&self, _id: Uuid) -> PortResult<()> {
            unimplemented!()
        }

        async fn increment_cancelled_bookings(&self, _id: Uuid) -> PortResult<()> {
            unimplemented!()
        }

        async fn set_provider_rating(&self, _id: Uuid, _rating: Rating) -> PortResult<()> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn racing_holiday_adds_yield_exactly_one_success() {
        let store = OverlayStore::new();
        let provider_id = Uuid::new_v4();
        store
            .mutate_availability(
                provider_id,
                holiday_mutation("2025-12-25".into(), "Christmas".into()),
            )
            .await
            .unwrap();

        // The duplicate check runs inside the mutation, against the overlay
        // as the store holds it, so a second add for the same date conflicts
        // even when both requests started from the same pre-state.
        let err = store
            .mutate_availability(
                provider_id,
                holiday_mutation("2025-12-25".into(), "Also Christmas".into()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
        assert_eq!(store.overlay.lock().unwrap().holidays.len(), 1);
    }

    #[test]
    fn availability_errors_map_onto_the_taxonomy() {
        assert!(matches!(
            availability_error(AvailabilityError::DuplicateHoliday),
            PortError::Conflict(_)
        ));
        assert!(matches!(
            availability_error(AvailabilityError::InvalidTime("9am".into())),
            PortError::Validation(_)
        ));
    }
}
