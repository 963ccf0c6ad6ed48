//! services/api/src/adapters/db/bookings.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nearserve_core::domain::booking::PaymentStatus;
use nearserve_core::domain::{
    Booking, BookingAddress, BookingContact, BookingStatus, BookingStatusCounts,
};
use nearserve_core::page::Page;
use nearserve_core::ports::{
    BookingStore, BookingUpdate, NewBooking, PortError, PortResult, SortBy, SortOrder,
};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::{enum_from_str, unexpected, DbAdapter};

#[derive(FromRow)]
struct BookingRecord {
    id: Uuid,
    service_id: Uuid,
    user_id: Uuid,
    provider_id: Uuid,
    scheduled_date: DateTime<Utc>,
    scheduled_time: String,
    status: String,
    price: f64,
    payment_status: String,
    customer_notes: Option<String>,
    provider_notes: Option<String>,
    address: Json<BookingAddress>,
    contact: Json<BookingContact>,
    cancellation_reason: Option<String>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl BookingRecord {
    fn to_domain(self) -> PortResult<Booking> {
        Ok(Booking {
            id: self.id,
            service_id: self.service_id,
            user_id: self.user_id,
            provider_id: self.provider_id,
            scheduled_date: self.scheduled_date,
            scheduled_time: self.scheduled_time,
            status: enum_from_str::<BookingStatus>(&self.status)?,
            price: self.price,
            payment_status: enum_from_str::<PaymentStatus>(&self.payment_status)?,
            customer_notes: self.customer_notes,
            provider_notes: self.provider_notes,
            address: self.address.0,
            contact: self.contact.0,
            cancellation_reason: self.cancellation_reason,
            completed_at: self.completed_at,
            cancelled_at: self.cancelled_at,
            created_at: self.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, service_id, user_id, provider_id, scheduled_date, \
     scheduled_time, status, price, payment_status, customer_notes, provider_notes, \
     address, contact, cancellation_reason, completed_at, cancelled_at, created_at";

fn sort_column(sort_by: SortBy) -> &'static str {
    match sort_by {
        SortBy::ScheduledDate => "scheduled_date",
        SortBy::Price => "price",
        // Rating is a catalog column; listings fall back to recency.
        SortBy::CreatedAt | SortBy::Rating => "created_at",
    }
}

/// Shared body of the customer and provider listings; only the owning
/// column differs.
async fn list_by_owner(
    adapter: &DbAdapter,
    owner_column: &str,
    owner_id: Uuid,
    status: Option<BookingStatus>,
    page: i64,
    limit: i64,
    sort_by: SortBy,
    sort_order: SortOrder,
) -> PortResult<(Vec<Booking>, i64)> {
    let mut count_builder =
        QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM bookings WHERE {owner_column} = "));
    count_builder.push_bind(owner_id);
    if let Some(status) = status {
        count_builder.push(" AND status = ").push_bind(status.as_str());
    }
    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(adapter.pool())
        .await
        .map_err(unexpected)?;

    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE {owner_column} = "
    ));
    builder.push_bind(owner_id);
    if let Some(status) = status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    let direction = match sort_order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    builder.push(format!(" ORDER BY {} {} LIMIT ", sort_column(sort_by), direction));
    builder.push_bind(limit);
    builder.push(" OFFSET ").push_bind(Page::offset(page, limit));

    let records = builder
        .build_query_as::<BookingRecord>()
        .fetch_all(adapter.pool())
        .await
        .map_err(unexpected)?;
    let bookings = records
        .into_iter()
        .map(BookingRecord::to_domain)
        .collect::<PortResult<Vec<_>>>()?;
    Ok((bookings, total))
}

#[async_trait]
impl BookingStore for DbAdapter {
    async fn create_booking(&self, new_booking: NewBooking) -> PortResult<Booking> {
        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "INSERT INTO bookings
                 (service_id, user_id, provider_id, scheduled_date, scheduled_time,
                  price, customer_notes, address, contact)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(new_booking.service_id)
        .bind(new_booking.user_id)
        .bind(new_booking.provider_id)
        .bind(new_booking.scheduled_date)
        .bind(&new_booking.scheduled_time)
        .bind(new_booking.price)
        .bind(&new_booking.customer_notes)
        .bind(Json(&new_booking.address))
        .bind(Json(&new_booking.contact))
        .fetch_one(self.pool())
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_booking(&self, booking_id: Uuid) -> PortResult<Booking> {
        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(booking_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("Booking not found".to_string()),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn list_customer_bookings(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
        page: i64,
        limit: i64,
        sort_by: SortBy,
        sort_order: SortOrder,
    ) -> PortResult<(Vec<Booking>, i64)> {
        list_by_owner(self, "user_id", user_id, status, page, limit, sort_by, sort_order).await
    }

    async fn list_provider_bookings(
        &self,
        provider_id: Uuid,
        status: Option<BookingStatus>,
        page: i64,
        limit: i64,
        sort_by: SortBy,
        sort_order: SortOrder,
    ) -> PortResult<(Vec<Booking>, i64)> {
        list_by_owner(
            self,
            "provider_id",
            provider_id,
            status,
            page,
            limit,
            sort_by,
            sort_order,
        )
        .await
    }

    async fn provider_status_counts(&self, provider_id: Uuid) -> PortResult<BookingStatusCounts> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS count FROM bookings
             WHERE provider_id = $1 GROUP BY status",
        )
        .bind(provider_id)
        .fetch_all(self.pool())
        .await
        .map_err(unexpected)?;

        let mut counts = BookingStatusCounts::default();
        for row in rows {
            let status: String = row.try_get("status").map_err(unexpected)?;
            let count: i64 = row.try_get("count").map_err(unexpected)?;
            match enum_from_str::<BookingStatus>(&status)? {
                BookingStatus::Pending => counts.pending = count,
                BookingStatus::Confirmed => counts.confirmed = count,
                BookingStatus::InProgress => counts.in_progress = count,
                BookingStatus::Completed => counts.completed = count,
                BookingStatus::Cancelled => counts.cancelled = count,
                BookingStatus::Rejected => {}
            }
        }
        Ok(counts)
    }

    async fn update_booking(
        &self,
        booking_id: Uuid,
        update: BookingUpdate,
    ) -> PortResult<Booking> {
        let record = sqlx::query_as::<_, BookingRecord>(&format!(
            "UPDATE bookings SET
                 status              = COALESCE($1, status),
                 provider_notes      = COALESCE($2, provider_notes),
                 cancellation_reason = COALESCE($3, cancellation_reason),
                 completed_at        = COALESCE($4, completed_at),
                 cancelled_at        = COALESCE($5, cancelled_at)
             WHERE id = $6
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(update.status.map(BookingStatus::as_str))
        .bind(update.provider_notes.as_ref())
        .bind(update.cancellation_reason.as_ref())
        .bind(update.completed_at)
        .bind(update.cancelled_at)
        .bind(booking_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound("Booking not found".to_string()),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }
}
