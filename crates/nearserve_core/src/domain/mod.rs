//! crates/nearserve_core/src/domain/mod.rs
//!
//! The pure domain model: entity types and the rules that operate on them.
//! Nothing in this tree touches a database or the network.

pub mod availability;
pub mod booking;
pub mod notification;
pub mod provider;
pub mod review;
pub mod service;
pub mod user;

pub use availability::{
    AvailabilityError, AvailabilityOverlay, Break, DayAvailability, Holiday, TimeSlot, Weekday,
};
pub use booking::{
    Booking, BookingAddress, BookingContact, BookingStatus, BookingStatusCounts, PaymentStatus,
};
pub use notification::{Notification, NotificationType, Priority, RelatedRef};
pub use provider::{
    Certification, ContactInfo, Experience, Provider, ProviderAddress, ProviderStats,
};
pub use review::Review;
pub use service::{Coordinates, PriceType, Service, ServiceCategory, ServiceLocation};
pub use user::{User, UserCredentials, UserRole};
