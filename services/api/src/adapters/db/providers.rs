//! services/api/src/adapters/db/providers.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nearserve_core::domain::{
    AvailabilityOverlay, Certification, ContactInfo, Experience, Provider, ProviderAddress,
    ProviderStats, ServiceCategory,
};
use nearserve_core::ports::{
    AvailabilityMutation, NewProvider, PortError, PortResult, ProviderProfileUpdate, ProviderStore,
};
use nearserve_core::rating::Rating;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{map_db_error, unexpected, DbAdapter};

#[derive(FromRow)]
struct ProviderRecord {
    id: Uuid,
    user_id: Uuid,
    business_name: Option<String>,
    bio: Option<String>,
    profile_image: Option<String>,
    cover_image: Option<String>,
    contact_info: Json<ContactInfo>,
    address: Json<ProviderAddress>,
    categories: Json<Vec<ServiceCategory>>,
    experience: Option<Json<Experience>>,
    certifications: Json<Vec<Certification>>,
    rating_average: f64,
    rating_count: i64,
    total_bookings: i64,
    completed_bookings: i64,
    cancelled_bookings: i64,
    availability: Json<AvailabilityOverlay>,
    is_verified: bool,
    is_active: bool,
    is_suspended: bool,
    created_at: DateTime<Utc>,
}

impl ProviderRecord {
    fn to_domain(self) -> Provider {
        Provider {
            id: self.id,
            user_id: self.user_id,
            business_name: self.business_name,
            bio: self.bio,
            profile_image: self.profile_image,
            cover_image: self.cover_image,
            contact_info: self.contact_info.0,
            address: self.address.0,
            categories: self.categories.0,
            experience: self.experience.map(|e| e.0),
            certifications: self.certifications.0,
            rating: Rating {
                average: self.rating_average,
                count: self.rating_count,
            },
            stats: ProviderStats {
                total_bookings: self.total_bookings,
                completed_bookings: self.completed_bookings,
                cancelled_bookings: self.cancelled_bookings,
            },
            availability: self.availability.0,
            is_verified: self.is_verified,
            is_active: self.is_active,
            is_suspended: self.is_suspended,
            created_at: self.created_at,
        }
    }
}

const PROVIDER_COLUMNS: &str = "id, user_id, business_name, bio, profile_image, cover_image, \
     contact_info, address, categories, experience, certifications, rating_average, \
     rating_count, total_bookings, completed_bookings, cancelled_bookings, availability, \
     is_verified, is_active, is_suspended, created_at";

#[async_trait]
impl ProviderStore for DbAdapter {
    async fn create_provider(&self, new_provider: NewProvider) -> PortResult<Provider> {
        let record = sqlx::query_as::<_, ProviderRecord>(&format!(
            "INSERT INTO providers
                 (user_id, business_name, bio, contact_info, address, categories,
                  experience, certifications)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PROVIDER_COLUMNS}"
        ))
        .bind(new_provider.user_id)
        .bind(&new_provider.business_name)
        .bind(&new_provider.bio)
        .bind(Json(&new_provider.contact_info))
        .bind(Json(&new_provider.address))
        .bind(Json(&new_provider.categories))
        .bind(new_provider.experience.as_ref().map(Json))
        .bind(Json(&new_provider.certifications))
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            map_db_error(
                e,
                "Provider profile already exists. Use update endpoint to modify.",
            )
        })?;
        Ok(record.to_domain())
    }

    async fn get_provider(&self, provider_id: Uuid) -> PortResult<Provider> {
        let record = sqlx::query_as::<_, ProviderRecord>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers WHERE id = $1"
        ))
        .bind(provider_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("Provider not found".to_string()),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn find_provider_by_user(&self, user_id: Uuid) -> PortResult<Option<Provider>> {
        let record = sqlx::query_as::<_, ProviderRecord>(&format!(
            "SELECT {PROVIDER_COLUMNS} FROM providers WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(unexpected)?;
        Ok(record.map(ProviderRecord::to_domain))
    }

    async fn update_provider_profile(
        &self,
        provider_id: Uuid,
        update: ProviderProfileUpdate,
    ) -> PortResult<Provider> {
        let record = sqlx::query_as::<_, ProviderRecord>(&format!(
            "UPDATE providers SET
                 business_name  = COALESCE($1, business_name),
                 bio            = COALESCE($2, bio),
                 profile_image  = COALESCE($3, profile_image),
                 cover_image    = COALESCE($4, cover_image),
                 contact_info   = COALESCE($5, contact_info),
                 address        = COALESCE($6, address),
                 categories     = COALESCE($7, categories),
                 experience     = COALESCE($8, experience),
                 certifications = COALESCE($9, certifications)
             WHERE id = $10
             RETURNING {PROVIDER_COLUMNS}"
        ))
        .bind(&update.business_name)
        .bind(&update.bio)
        .bind(&update.profile_image)
        .bind(&update.cover_image)
        .bind(update.contact_info.as_ref().map(Json))
        .bind(update.address.as_ref().map(Json))
        .bind(update.categories.as_ref().map(Json))
        .bind(update.experience.as_ref().map(Json))
        .bind(update.certifications.as_ref().map(Json))
        .bind(provider_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("Provider not found".to_string()),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn mutate_availability(
        &self,
        provider_id: Uuid,
        apply: AvailabilityMutation,
    ) -> PortResult<AvailabilityOverlay> {
        // FOR UPDATE serializes concurrent edits to the same provider, so
        // duplicate checks inside `apply` run against the latest overlay.
        let mut tx = self.pool().begin().await.map_err(unexpected)?;
        let row: Option<Json<AvailabilityOverlay>> =
            sqlx::query_scalar("SELECT availability FROM providers WHERE id = $1 FOR UPDATE")
                .bind(provider_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(unexpected)?;
        let mut overlay = row
            .ok_or_else(|| PortError::NotFound("Provider not found".to_string()))?
            .0;
        apply(&mut overlay)?;
        sqlx::query("UPDATE providers SET availability = $1 WHERE id = $2")
            .bind(Json(&overlay))
            .bind(provider_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(overlay)
    }

    async fn increment_completed_bookings(&self, provider_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "UPDATE providers SET completed_bookings = completed_bookings + 1 WHERE id = $1",
        )
        .bind(provider_id)
        .execute(self.pool())
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn increment_cancelled_bookings(&self, provider_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "UPDATE providers SET cancelled_bookings = cancelled_bookings + 1 WHERE id = $1",
        )
        .bind(provider_id)
        .execute(self.pool())
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn set_provider_rating(&self, provider_id: Uuid, rating: Rating) -> PortResult<()> {
        sqlx::query("UPDATE providers SET rating_average = $1, rating_count = $2 WHERE id = $3")
            .bind(rating.average)
            .bind(rating.count)
            .bind(provider_id)
            .execute(self.pool())
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
