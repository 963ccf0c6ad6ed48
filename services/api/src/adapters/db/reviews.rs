//! services/api/src/adapters/db/reviews.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nearserve_core::domain::Review;
use nearserve_core::page::Page;
use nearserve_core::ports::{NewReview, PortError, PortResult, ReviewStore};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{map_db_error, unexpected, DbAdapter};

#[derive(FromRow)]
struct ReviewRecord {
    id: Uuid,
    booking_id: Uuid,
    service_id: Uuid,
    provider_id: Uuid,
    user_id: Uuid,
    rating: i16,
    comment: String,
    images: Json<Vec<String>>,
    created_at: DateTime<Utc>,
}

impl ReviewRecord {
    fn to_domain(self) -> Review {
        Review {
            id: self.id,
            booking_id: self.booking_id,
            service_id: self.service_id,
            provider_id: self.provider_id,
            user_id: self.user_id,
            rating: self.rating,
            comment: self.comment,
            images: self.images.0,
            created_at: self.created_at,
        }
    }
}

const REVIEW_COLUMNS: &str =
    "id, booking_id, service_id, provider_id, user_id, rating, comment, images, created_at";

#[async_trait]
impl ReviewStore for DbAdapter {
    async fn create_review(&self, new_review: NewReview) -> PortResult<Review> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "INSERT INTO reviews
                 (booking_id, service_id, provider_id, user_id, rating, comment, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(new_review.booking_id)
        .bind(new_review.service_id)
        .bind(new_review.provider_id)
        .bind(new_review.user_id)
        .bind(new_review.rating)
        .bind(&new_review.comment)
        .bind(Json(&new_review.images))
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_db_error(e, "Review already exists for this booking"))?;
        Ok(record.to_domain())
    }

    async fn get_review(&self, review_id: Uuid) -> PortResult<Review> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(review_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("Review not found".to_string()),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn find_review_by_booking(&self, booking_id: Uuid) -> PortResult<Option<Review>> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE booking_id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(self.pool())
        .await
        .map_err(unexpected)?;
        Ok(record.map(ReviewRecord::to_domain))
    }

    async fn delete_review(&self, review_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(self.pool())
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("Review not found".to_string()));
        }
        Ok(())
    }

    async fn list_service_reviews(
        &self,
        service_id: Uuid,
        page: i64,
        limit: i64,
    ) -> PortResult<(Vec<Review>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE service_id = $1")
            .bind(service_id)
            .fetch_one(self.pool())
            .await
            .map_err(unexpected)?;

        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE service_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(service_id)
        .bind(limit)
        .bind(Page::offset(page, limit))
        .fetch_all(self.pool())
        .await
        .map_err(unexpected)?;
        Ok((records.into_iter().map(ReviewRecord::to_domain).collect(), total))
    }

    async fn list_user_reviews(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> PortResult<(Vec<Review>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(unexpected)?;

        let records = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(limit)
        .bind(Page::offset(page, limit))
        .fetch_all(self.pool())
        .await
        .map_err(unexpected)?;
        Ok((records.into_iter().map(ReviewRecord::to_domain).collect(), total))
    }

    async fn service_ratings(&self, service_id: Uuid) -> PortResult<Vec<i16>> {
        sqlx::query_scalar("SELECT rating FROM reviews WHERE service_id = $1")
            .bind(service_id)
            .fetch_all(self.pool())
            .await
            .map_err(unexpected)
    }

    async fn provider_ratings(&self, provider_id: Uuid) -> PortResult<Vec<i16>> {
        sqlx::query_scalar("SELECT rating FROM reviews WHERE provider_id = $1")
            .bind(provider_id)
            .fetch_all(self.pool())
            .await
            .map_err(unexpected)
    }
}
