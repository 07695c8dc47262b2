pub mod bookings;
pub mod events;
pub mod venues;
