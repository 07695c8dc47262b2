//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Methods take `&PgPool`, or any [`sqlx::PgExecutor`] when they also run
//! inside a booking transaction.

pub mod booking_repo;
pub mod event_repo;
pub mod seat_repo;
pub mod user_repo;
pub mod venue_repo;

pub use booking_repo::BookingRepo;
pub use event_repo::EventRepo;
pub use seat_repo::SeatRepo;
pub use user_repo::UserRepo;
pub use venue_repo::VenueRepo;
