//! services/api/src/adapters/db/mod.rs
//!
//! The database adapter: the concrete implementation of the core store
//! ports against PostgreSQL via `sqlx`. One submodule per entity; all of
//! them implement their port trait for the single `DbAdapter`.
//!
//! Document-style sub-records (availability overlay, addresses, contacts)
//! live in JSONB columns and are (de)serialized through the domain types'
//! serde implementations, so the wire shape and the stored shape agree.

use nearserve_core::ports::{PortError, PortResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::PgPool;

mod bookings;
mod notifications;
mod providers;
mod reviews;
mod services;
mod users;

/// A database adapter that implements the store ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a low-level sqlx error to the port taxonomy. Unique-index
/// violations become conflicts; everything else is unexpected.
pub(crate) fn map_db_error(err: sqlx::Error, conflict_message: &str) -> PortError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            return PortError::Conflict(conflict_message.to_string());
        }
    }
    PortError::Unexpected(err.to_string())
}

pub(crate) fn unexpected(err: sqlx::Error) -> PortError {
    PortError::Unexpected(err.to_string())
}

/// Renders a wire-format enum (e.g. `BookingStatus::InProgress`) to the
/// TEXT value stored in the database, via its serde representation.
pub(crate) fn enum_to_str<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(text)) => text,
        _ => String::new(),
    }
}

/// The inverse of [`enum_to_str`]; a stored value no variant matches is a
/// data-corruption signal and surfaces as unexpected.
pub(crate) fn enum_from_str<T: DeserializeOwned>(value: &str) -> PortResult<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|_| PortError::Unexpected(format!("unrecognized stored value '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearserve_core::domain::{BookingStatus, NotificationType, ServiceCategory};

    #[test]
    fn enums_round_trip_through_their_wire_spelling() {
        assert_eq!(enum_to_str(&BookingStatus::InProgress), "in-progress");
        assert_eq!(enum_to_str(&ServiceCategory::Plumber), "plumber");
        assert_eq!(enum_to_str(&NotificationType::BookingCreated), "booking_created");

        let status: BookingStatus = enum_from_str("in-progress").unwrap();
        assert_eq!(status, BookingStatus::InProgress);
        assert!(enum_from_str::<BookingStatus>("bogus").is_err());
    }
}
