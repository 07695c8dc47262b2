//! Storage port for the booking lifecycle.
//!
//! [`BookingStore`] is the shared handle the service is constructed with.
//! Every mutation of seats, the available-seat counter, or bookings happens
//! through a [`BookingTx`]: a single transaction that either commits as a
//! whole or, when dropped without [`commit`](BookingTx::commit), leaves no
//! trace.

use async_trait::async_trait;

use crate::booking::{Booking, NewBooking};
use crate::catalog::{Event, NewEvent};
use crate::inventory::Seat;
use crate::status::SeatStatus;
use crate::types::DbId;

/// Unique constraint on `bookings.booking_code`.
pub const UQ_BOOKING_CODE: &str = "uq_bookings_booking_code";

/// Partial unique index: at most one confirmed booking per seat.
pub const UQ_ACTIVE_SEAT: &str = "uq_bookings_active_seat";

/// Partial unique index: at most one confirmed booking per (user, event).
pub const UQ_ACTIVE_USER_EVENT: &str = "uq_bookings_active_user_event";

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Any other backend failure (connection, serialization, I/O).
    #[error("storage failure: {0}")]
    Backend(String),
}

/// Shared handle to the booking store.
#[async_trait]
pub trait BookingStore: Send + Sync + 'static {
    type Tx: BookingTx;

    /// Open a transaction.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    async fn find_event(&self, event_id: DbId) -> Result<Option<Event>, StoreError>;

    async fn find_booking(&self, booking_id: DbId) -> Result<Option<Booking>, StoreError>;

    /// All bookings, or only those of `user_id` when given. Newest first.
    async fn list_bookings(&self, user_id: Option<DbId>) -> Result<Vec<Booking>, StoreError>;

    /// Seats of an event ordered by id, optionally filtered by status.
    async fn list_seats(
        &self,
        event_id: DbId,
        status: Option<SeatStatus>,
    ) -> Result<Vec<Seat>, StoreError>;

    /// Insert the event with `available_seats = total_seats` and generate its
    /// seats. Nothing persists if any part fails.
    async fn create_event_with_seats(&self, input: &NewEvent) -> Result<Event, StoreError>;
}

/// One storage transaction.
///
/// Conditional operations return `None` instead of an error when their guard
/// does not hold, so the caller decides which domain error applies.
#[async_trait]
pub trait BookingTx: Send {
    async fn find_event(&mut self, event_id: DbId) -> Result<Option<Event>, StoreError>;

    async fn user_exists(&mut self, user_id: DbId) -> Result<bool, StoreError>;

    /// The confirmed booking `user_id` holds for `event_id`, if any.
    async fn find_active_booking(
        &mut self,
        user_id: DbId,
        event_id: DbId,
    ) -> Result<Option<Booking>, StoreError>;

    /// Transition a seat `available -> booked`.
    ///
    /// Returns `None` when the seat does not exist, belongs to another event,
    /// or is not available. Only one concurrent caller can succeed.
    async fn reserve_seat(&mut self, event_id: DbId, seat_id: DbId)
        -> Result<Option<Seat>, StoreError>;

    /// Set a seat back to `available` unconditionally.
    async fn release_seat(&mut self, seat_id: DbId) -> Result<(), StoreError>;

    /// Insert a booking with status `confirmed`.
    async fn insert_booking(&mut self, input: &NewBooking) -> Result<Booking, StoreError>;

    /// Load a booking and hold it exclusively until the transaction ends.
    async fn lock_booking(&mut self, booking_id: DbId) -> Result<Option<Booking>, StoreError>;

    /// Transition a booking `confirmed -> cancelled`.
    ///
    /// Returns `None` when the booking is missing or already cancelled.
    async fn cancel_booking(&mut self, booking_id: DbId) -> Result<Option<Booking>, StoreError>;

    /// Decrement `available_seats` by one if it is positive.
    async fn decrement_available(&mut self, event_id: DbId) -> Result<Option<Event>, StoreError>;

    /// Increment `available_seats` by one if it is below `total_seats`.
    async fn increment_available(&mut self, event_id: DbId) -> Result<Option<Event>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
}
