//! services/api/src/web/services.rs
//!
//! The public service catalog (list, search, detail, reviews) and the
//! provider-side CRUD.

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

use crate::web::middleware::AuthUser;
use crate::web::respond::{message, ApiResult};
use crate::web::reviews::ReviewPayload;
use crate::web::state::AppState;
use nearserve_core::domain::{PriceType, Provider, Service, ServiceCategory, ServiceLocation};
use nearserve_core::page::Page;
use nearserve_core::ports::{
    NewService, PortError, ServiceFilter, ServiceSearch, ServiceUpdate, SortBy, SortOrder,
};
use nearserve_core::rating::{Rating, RatingDistribution};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ServicePayload {
    pub id: Uuid,
    #[serde(rename = "providerId")]
    pub provider_id: Uuid,
    pub title: String,
    pub description: String,
    #[schema(value_type = String)]
    pub category: ServiceCategory,
    pub price: f64,
    #[serde(rename = "priceType")]
    #[schema(value_type = String)]
    pub price_type: PriceType,
    #[schema(value_type = Object)]
    pub location: ServiceLocation,
    pub availability: bool,
    #[schema(value_type = Object)]
    pub rating: Rating,
    pub images: Vec<String>,
    #[serde(rename = "serviceAreaKm")]
    pub service_area_km: i32,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<Service> for ServicePayload {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            provider_id: service.provider_id,
            title: service.title,
            description: service.description,
            category: service.category,
            price: service.price,
            price_type: service.price_type,
            location: service.location,
            availability: service.availability,
            rating: service.rating,
            images: service.images,
            service_area_km: service.service_area_km,
            is_active: service.is_active,
            created_at: service.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateServiceRequest {
    pub title: String,
    pub description: String,
    #[schema(value_type = String)]
    pub category: ServiceCategory,
    pub price: f64,
    #[serde(rename = "priceType", default = "default_price_type")]
    #[schema(value_type = String)]
    pub price_type: PriceType,
    #[schema(value_type = Object)]
    pub location: ServiceLocation,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(rename = "serviceAreaKm", default = "default_service_area")]
    pub service_area_km: i32,
}

fn default_price_type() -> PriceType {
    PriceType::Hourly
}

fn default_service_area() -> i32 {
    10
}

#[derive(Deserialize, Default, ToSchema)]
pub struct UpdateServiceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub category: Option<ServiceCategory>,
    pub price: Option<f64>,
    #[serde(rename = "priceType")]
    #[schema(value_type = Option<String>)]
    pub price_type: Option<PriceType>,
    #[schema(value_type = Object)]
    pub location: Option<ServiceLocation>,
    pub images: Option<Vec<String>>,
    #[serde(rename = "serviceAreaKm")]
    pub service_area_km: Option<i32>,
    pub availability: Option<bool>,
    #[serde(rename = "isActive")]
    pub is_active: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct ListServicesQuery {
    pub category: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<f64>,
    #[serde(rename = "minRating")]
    pub min_rating: Option<f64>,
    pub availability: Option<bool>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SearchServicesQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Search radius in kilometres around (lat, lng); defaults to 10.
    pub radius: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

//=========================================================================================
// Helpers
//=========================================================================================

pub(crate) fn parse_category(value: &str) -> Result<ServiceCategory, PortError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| PortError::Validation(format!("'{value}' is not a valid category")))
}

fn parse_sort(
    sort_by: Option<&str>,
    sort_order: Option<&str>,
) -> (SortBy, SortOrder) {
    let by = match sort_by {
        Some("price") => SortBy::Price,
        Some("rating") => SortBy::Rating,
        _ => SortBy::CreatedAt,
    };
    let order = match sort_order {
        Some("asc") => SortOrder::Asc,
        _ => SortOrder::Desc,
    };
    (by, order)
}

fn clamp_paging(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> (i64, i64) {
    (page.unwrap_or(1).max(1), limit.unwrap_or(default_limit).clamp(1, 100))
}

/// One degree of latitude is ~111 km; longitude shrinks with the cosine.
fn bounding_box(lat: f64, lng: f64, radius_km: f64) -> ((f64, f64), (f64, f64)) {
    let lat_delta = radius_km / 111.0;
    let lng_delta = radius_km / (111.0 * lat.to_radians().cos().abs().max(1e-6));
    (
        (lat - lat_delta, lat + lat_delta),
        (lng - lng_delta, lng + lng_delta),
    )
}

/// Loads the caller's provider profile and checks it may publish services.
async fn publishing_provider(state: &AppState, auth: &AuthUser) -> Result<Provider, PortError> {
    let provider = state
        .store
        .find_provider_by_user(auth.id)
        .await?
        .ok_or_else(|| {
            PortError::Forbidden(
                "Only providers can create services. Please create a provider profile first."
                    .to_string(),
            )
        })?;
    if !provider.is_active || provider.is_suspended {
        return Err(PortError::Forbidden(
            "Your provider account is not active or is suspended.".to_string(),
        ));
    }
    Ok(provider)
}

//=========================================================================================
// Public Catalog Handlers
//=========================================================================================

/// GET /services - Filtered, paginated catalog listing
#[utoipa::path(
    get,
    path = "/services",
    params(
        ("category" = Option<String>, Query, description = "Service category"),
        ("city" = Option<String>, Query, description = "Exact city match"),
        ("minPrice" = Option<f64>, Query, description = "Lower price bound"),
        ("maxPrice" = Option<f64>, Query, description = "Upper price bound"),
        ("minRating" = Option<f64>, Query, description = "Minimum average rating"),
        ("search" = Option<String>, Query, description = "Title/description substring"),
        ("page" = Option<i64>, Query, description = "Page number, 1-based"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("sortBy" = Option<String>, Query, description = "createdAt | price | rating"),
        ("sortOrder" = Option<String>, Query, description = "asc | desc")
    ),
    responses((status = 200, description = "Catalog page", body = Vec<ServicePayload>))
)]
pub async fn list_services_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListServicesQuery>,
) -> ApiResult<impl IntoResponse> {
    let category = query
        .category
        .as_deref()
        .map(parse_category)
        .transpose()?;
    let (page, limit) = clamp_paging(query.page, query.limit, 10);
    let (sort_by, sort_order) = parse_sort(query.sort_by.as_deref(), query.sort_order.as_deref());

    let filter = ServiceFilter {
        category,
        city: query.city,
        min_price: query.min_price,
        max_price: query.max_price,
        min_rating: query.min_rating,
        availability: query.availability,
        search: query.search,
    };
    let (services, total) = state
        .store
        .list_services(filter, page, limit, sort_by, sort_order)
        .await?;
    let payload: Vec<ServicePayload> = services.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "data": payload,
        "pagination": Page::new(total, page, limit),
    })))
}

/// GET /services/search - Top matches by text, category, and location box
#[utoipa::path(
    get,
    path = "/services/search",
    params(
        ("q" = Option<String>, Query, description = "Free-text query"),
        ("category" = Option<String>, Query, description = "Service category"),
        ("city" = Option<String>, Query, description = "Exact city match"),
        ("lat" = Option<f64>, Query, description = "Latitude of the search center"),
        ("lng" = Option<f64>, Query, description = "Longitude of the search center"),
        ("radius" = Option<f64>, Query, description = "Radius in km, default 10")
    ),
    responses((status = 200, description = "Best-rated matches", body = Vec<ServicePayload>))
)]
pub async fn search_services_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchServicesQuery>,
) -> ApiResult<impl IntoResponse> {
    let category = query
        .category
        .as_deref()
        .map(parse_category)
        .transpose()?;

    let (lat_range, lng_range) = match (query.lat, query.lng) {
        (Some(lat), Some(lng)) => {
            let (lat_range, lng_range) = bounding_box(lat, lng, query.radius.unwrap_or(10.0));
            (Some(lat_range), Some(lng_range))
        }
        _ => (None, None),
    };

    let services = state
        .store
        .search_services(
            ServiceSearch {
                text: query.q,
                category,
                city: query.city,
                lat_range,
                lng_range,
            },
            20,
        )
        .await?;
    let payload: Vec<ServicePayload> = services.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "success": true, "data": payload })))
}

/// GET /services/{id} - Service detail
#[utoipa::path(
    get,
    path = "/services/{id}",
    params(("id" = Uuid, Path, description = "Service id")),
    responses(
        (status = 200, description = "The service", body = ServicePayload),
        (status = 404, description = "Service not found")
    )
)]
pub async fn get_service_handler(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let service = state.store.get_service(service_id).await?;
    Ok(Json(json!({
        "success": true,
        "data": ServicePayload::from(service),
    })))
}

/// GET /services/{id}/reviews - Paginated reviews plus the star histogram
#[utoipa::path(
    get,
    path = "/services/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Service id"),
        ("page" = Option<i64>, Query, description = "Page number, 1-based"),
        ("limit" = Option<i64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Reviews and rating distribution"),
        (status = 404, description = "Service not found")
    )
)]
pub async fn service_reviews_handler(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    Query(query): Query<ReviewsQuery>,
) -> ApiResult<impl IntoResponse> {
    // 404 before paging so a bad id is not an empty page.
    let service = state.store.get_service(service_id).await?;

    let (page, limit) = clamp_paging(query.page, query.limit, 10);
    let (reviews, total) = state
        .store
        .list_service_reviews(service_id, page, limit)
        .await?;
    let ratings = state.store.service_ratings(service_id).await?;
    let payload: Vec<ReviewPayload> = reviews.into_iter().map(Into::into).collect();
    Ok(Json(json!({
        "success": true,
        "data": payload,
        "pagination": Page::new(total, page, limit),
        "stats": {
            "rating": service.rating,
            "distribution": RatingDistribution::from_ratings(&ratings),
        },
    })))
}

//=========================================================================================
// Provider-side CRUD
//=========================================================================================

/// POST /services - Publish a new service
#[utoipa::path(
    post,
    path = "/services",
    request_body = CreateServiceRequest,
    responses(
        (status = 201, description = "Service created", body = ServicePayload),
        (status = 400, description = "Missing fields"),
        (status = 403, description = "No provider profile, or suspended")
    ),
    security(("bearer" = []))
)]
pub async fn create_service_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateServiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let provider = publishing_provider(&state, &auth).await?;

    if req.title.is_empty() || req.description.is_empty() {
        return Err(PortError::Validation(
            "Title, description, category, and price are required".to_string(),
        )
        .into());
    }
    if req.price < 0.0 {
        return Err(PortError::Validation("Price must be non-negative".to_string()).into());
    }
    if req.location.city.is_empty() {
        return Err(PortError::Validation("Location with city is required".to_string()).into());
    }

    let service = state
        .store
        .create_service(NewService {
            provider_id: provider.id,
            title: req.title,
            description: req.description,
            category: req.category,
            price: req.price,
            price_type: req.price_type,
            location: req.location,
            images: req.images,
            service_area_km: req.service_area_km,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Service created successfully",
            "data": ServicePayload::from(service),
        })),
    ))
}

/// PUT /services/{id} - Update an owned service
#[utoipa::path(
    put,
    path = "/services/{id}",
    params(("id" = Uuid, Path, description = "Service id")),
    request_body = UpdateServiceRequest,
    responses(
        (status = 200, description = "Service updated", body = ServicePayload),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Service not found")
    ),
    security(("bearer" = []))
)]
pub async fn update_service_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(service_id): Path<Uuid>,
    Json(req): Json<UpdateServiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let service = state.store.get_service(service_id).await?;
    let provider = state
        .store
        .find_provider_by_user(auth.id)
        .await?
        .ok_or_else(|| PortError::Forbidden("Only providers can update services".to_string()))?;
    if service.provider_id != provider.id {
        return Err(
            PortError::Forbidden("You can only update your own services".to_string()).into(),
        );
    }

    let updated = state
        .store
        .update_service(
            service_id,
            ServiceUpdate {
                title: req.title,
                description: req.description,
                category: req.category,
                price: req.price,
                price_type: req.price_type,
                location: req.location,
                images: req.images,
                service_area_km: req.service_area_km,
                availability: req.availability,
                is_active: req.is_active,
            },
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Service updated successfully",
        "data": ServicePayload::from(updated),
    })))
}

/// DELETE /services/{id} - Delete an owned service
#[utoipa::path(
    delete,
    path = "/services/{id}",
    params(("id" = Uuid, Path, description = "Service id")),
    responses(
        (status = 200, description = "Service deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Service not found")
    ),
    security(("bearer" = []))
)]
pub async fn delete_service_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(service_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let service = state.store.get_service(service_id).await?;
    let provider = state
        .store
        .find_provider_by_user(auth.id)
        .await?
        .ok_or_else(|| PortError::Forbidden("Only providers can delete services".to_string()))?;
    if service.provider_id != provider.id {
        return Err(
            PortError::Forbidden("You can only delete your own services".to_string()).into(),
        );
    }

    state.store.delete_service(service_id).await?;
    Ok(message("Service deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parsing_uses_wire_spellings() {
        assert_eq!(parse_category("plumber").unwrap(), ServiceCategory::Plumber);
        assert!(parse_category("Plumber").is_err());
        assert!(parse_category("astronaut").is_err());
    }

    #[test]
    fn sort_parsing_whitelists_columns() {
        assert_eq!(parse_sort(Some("price"), Some("asc")), (SortBy::Price, SortOrder::Asc));
        assert_eq!(
            parse_sort(Some("rating"), None),
            (SortBy::Rating, SortOrder::Desc)
        );
        assert_eq!(
            parse_sort(Some("scheduled_date; DROP TABLE services"), Some("up")),
            (SortBy::CreatedAt, SortOrder::Desc)
        );
    }

    #[test]
    fn bounding_box_is_symmetric_around_the_center() {
        let ((lat_min, lat_max), (lng_min, lng_max)) = bounding_box(18.52, 73.85, 10.0);
        assert!(lat_min < 18.52 && 18.52 < lat_max);
        assert!(lng_min < 73.85 && 73.85 < lng_max);
        assert!((lat_max - lat_min - 2.0 * 10.0 / 111.0).abs() < 1e-9);
    }

    #[test]
    fn paging_is_clamped() {
        assert_eq!(clamp_paging(None, None, 10), (1, 10));
        assert_eq!(clamp_paging(Some(0), Some(500), 10), (1, 100));
        assert_eq!(clamp_paging(Some(3), Some(20), 10), (3, 20));
    }
}
