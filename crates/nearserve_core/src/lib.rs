pub mod domain;
pub mod page;
pub mod ports;
pub mod rating;
pub mod validate;

pub use domain::{
    AvailabilityOverlay, Booking, BookingStatus, Break, DayAvailability, Holiday, Notification,
    NotificationType, Priority, Provider, RelatedRef, Review, Service, ServiceCategory, TimeSlot,
    User, UserCredentials, UserRole, Weekday,
};
pub use ports::{
    BookingStore, IdentityProvider, NotificationStore, PortError, PortResult, ProviderStore,
    ReviewStore, ServiceStore, Store, UserStore,
};
pub use rating::Rating;
