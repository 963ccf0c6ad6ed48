//! services/api/src/adapters/db/services.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nearserve_core::domain::service::PriceType;
use nearserve_core::domain::{Service, ServiceCategory, ServiceLocation};
use nearserve_core::page::Page;
use nearserve_core::ports::{
    NewService, PortError, PortResult, ServiceFilter, ServiceSearch, ServiceStore, ServiceUpdate,
    SortBy, SortOrder,
};
use nearserve_core::rating::Rating;
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{enum_from_str, enum_to_str, unexpected, DbAdapter};

#[derive(FromRow)]
struct ServiceRecord {
    id: Uuid,
    provider_id: Uuid,
    title: String,
    description: String,
    category: String,
    price: f64,
    price_type: String,
    location: Json<ServiceLocation>,
    availability: bool,
    rating: f64,
    review_count: i64,
    images: Json<Vec<String>>,
    service_area_km: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl ServiceRecord {
    fn to_domain(self) -> PortResult<Service> {
        Ok(Service {
            id: self.id,
            provider_id: self.provider_id,
            title: self.title,
            description: self.description,
            category: enum_from_str::<ServiceCategory>(&self.category)?,
            price: self.price,
            price_type: enum_from_str::<PriceType>(&self.price_type)?,
            location: self.location.0,
            availability: self.availability,
            rating: Rating {
                average: self.rating,
                count: self.review_count,
            },
            images: self.images.0,
            service_area_km: self.service_area_km,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

const SERVICE_COLUMNS: &str = "id, provider_id, title, description, category, price, price_type, \
     location, availability, rating, review_count, images, service_area_km, is_active, created_at";

fn sort_column(sort_by: SortBy) -> &'static str {
    match sort_by {
        SortBy::Price => "price",
        SortBy::Rating => "rating",
        // Scheduled-date sorting only makes sense for bookings; fall back.
        SortBy::CreatedAt | SortBy::ScheduledDate => "created_at",
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Appends the shared WHERE clauses for the public catalog listing.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ServiceFilter) {
    builder.push(" WHERE is_active = TRUE");
    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(enum_to_str(&category));
    }
    if let Some(city) = &filter.city {
        builder.push(" AND location ->> 'city' = ").push_bind(city.clone());
    }
    if let Some(min_price) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max_price);
    }
    if let Some(min_rating) = filter.min_rating {
        builder.push(" AND rating >= ").push_bind(min_rating);
    }
    if let Some(availability) = filter.availability {
        builder.push(" AND availability = ").push_bind(availability);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl ServiceStore for DbAdapter {
    async fn create_service(&self, new_service: NewService) -> PortResult<Service> {
        let record = sqlx::query_as::<_, ServiceRecord>(&format!(
            "INSERT INTO services
                 (provider_id, title, description, category, price, price_type,
                  location, images, service_area_km)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(new_service.provider_id)
        .bind(&new_service.title)
        .bind(&new_service.description)
        .bind(enum_to_str(&new_service.category))
        .bind(new_service.price)
        .bind(enum_to_str(&new_service.price_type))
        .bind(Json(&new_service.location))
        .bind(Json(&new_service.images))
        .bind(new_service.service_area_km)
        .fetch_one(self.pool())
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_service(&self, service_id: Uuid) -> PortResult<Service> {
        let record = sqlx::query_as::<_, ServiceRecord>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(service_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("Service not found".to_string()),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn update_service(
        &self,
        service_id: Uuid,
        update: ServiceUpdate,
    ) -> PortResult<Service> {
        let record = sqlx::query_as::<_, ServiceRecord>(&format!(
            "UPDATE services SET
                 title           = COALESCE($1, title),
                 description     = COALESCE($2, description),
                 category        = COALESCE($3, category),
                 price           = COALESCE($4, price),
                 price_type      = COALESCE($5, price_type),
                 location        = COALESCE($6, location),
                 images          = COALESCE($7, images),
                 service_area_km = COALESCE($8, service_area_km),
                 availability    = COALESCE($9, availability),
                 is_active       = COALESCE($10, is_active)
             WHERE id = $11
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(update.title.as_ref())
        .bind(update.description.as_ref())
        .bind(update.category.as_ref().map(enum_to_str))
        .bind(update.price)
        .bind(update.price_type.as_ref().map(enum_to_str))
        .bind(update.location.as_ref().map(Json))
        .bind(update.images.as_ref().map(Json))
        .bind(update.service_area_km)
        .bind(update.availability)
        .bind(update.is_active)
        .bind(service_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("Service not found".to_string()),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn delete_service(&self, service_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(service_id)
            .execute(self.pool())
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("Service not found".to_string()));
        }
        Ok(())
    }

    async fn list_services(
        &self,
        filter: ServiceFilter,
        page: i64,
        limit: i64,
        sort_by: SortBy,
        sort_order: SortOrder,
    ) -> PortResult<(Vec<Service>, i64)> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM services");
        push_filter(&mut count_builder, &filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(unexpected)?;

        let mut builder =
            QueryBuilder::new(format!("SELECT {SERVICE_COLUMNS} FROM services"));
        push_filter(&mut builder, &filter);
        builder.push(format!(
            " ORDER BY {} {} LIMIT ",
            sort_column(sort_by),
            sort_direction(sort_order)
        ));
        builder.push_bind(limit);
        builder.push(" OFFSET ").push_bind(Page::offset(page, limit));

        let records = builder
            .build_query_as::<ServiceRecord>()
            .fetch_all(self.pool())
            .await
            .map_err(unexpected)?;
        let services = records
            .into_iter()
            .map(ServiceRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok((services, total))
    }

    async fn search_services(
        &self,
        search: ServiceSearch,
        limit: i64,
    ) -> PortResult<Vec<Service>> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {SERVICE_COLUMNS} FROM services \
             WHERE is_active = TRUE AND availability = TRUE"
        ));
        if let Some(text) = &search.text {
            let pattern = format!("%{}%", text);
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category) = search.category {
            builder.push(" AND category = ").push_bind(enum_to_str(&category));
        }
        if let Some(city) = &search.city {
            builder.push(" AND location ->> 'city' = ").push_bind(city.clone());
        }
        if let Some((lat_min, lat_max)) = search.lat_range {
            builder
                .push(" AND (location #>> '{coordinates,latitude}')::float8 BETWEEN ")
                .push_bind(lat_min)
                .push(" AND ")
                .push_bind(lat_max);
        }
        if let Some((lng_min, lng_max)) = search.lng_range {
            builder
                .push(" AND (location #>> '{coordinates,longitude}')::float8 BETWEEN ")
                .push_bind(lng_min)
                .push(" AND ")
                .push_bind(lng_max);
        }
        builder.push(" ORDER BY rating DESC, created_at DESC LIMIT ").push_bind(limit);

        let records = builder
            .build_query_as::<ServiceRecord>()
            .fetch_all(self.pool())
            .await
            .map_err(unexpected)?;
        records.into_iter().map(ServiceRecord::to_domain).collect()
    }

    async fn list_provider_services(&self, provider_id: Uuid) -> PortResult<Vec<Service>> {
        let records = sqlx::query_as::<_, ServiceRecord>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services
             WHERE provider_id = $1 ORDER BY created_at DESC"
        ))
        .bind(provider_id)
        .fetch_all(self.pool())
        .await
        .map_err(unexpected)?;
        records.into_iter().map(ServiceRecord::to_domain).collect()
    }

    async fn set_service_rating(&self, service_id: Uuid, rating: Rating) -> PortResult<()> {
        sqlx::query("UPDATE services SET rating = $1, review_count = $2 WHERE id = $3")
            .bind(rating.average)
            .bind(rating.count)
            .bind(service_id)
            .execute(self.pool())
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
