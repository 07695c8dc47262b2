//! PostgreSQL implementation of the booking storage port.
//!
//! Each [`PgBookingTx`] owns one `sqlx` transaction. Dropping it without
//! calling `commit` rolls the transaction back, so an early return from the
//! lifecycle leaves no partial writes behind.

use async_trait::async_trait;
use boxoffice_core::booking::{Booking, NewBooking};
use boxoffice_core::catalog::{Event, NewEvent};
use boxoffice_core::inventory::Seat;
use boxoffice_core::lifecycle::{BookingStore, BookingTx, StoreError};
use boxoffice_core::status::SeatStatus;
use boxoffice_core::types::DbId;
use sqlx::{Postgres, Transaction};

use crate::repositories::{BookingRepo, EventRepo, SeatRepo, UserRepo};
use crate::DbPool;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Translate a sqlx error into the port's vocabulary.
///
/// Unique violations keep the name of the violated constraint (or unique
/// index) so the lifecycle can map each one to its own domain error.
pub fn store_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return StoreError::UniqueViolation(constraint.to_string());
        }
    }
    StoreError::Backend(err.to_string())
}

/// Booking store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgBookingStore {
    pool: DbPool,
}

impl PgBookingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    type Tx = PgBookingTx;

    async fn begin(&self) -> Result<PgBookingTx, StoreError> {
        let tx = self.pool.begin().await.map_err(store_error)?;
        Ok(PgBookingTx { tx })
    }

    async fn find_event(&self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        EventRepo::find_by_id(&self.pool, event_id)
            .await
            .map_err(store_error)
    }

    async fn find_booking(&self, booking_id: DbId) -> Result<Option<Booking>, StoreError> {
        BookingRepo::find_by_id(&self.pool, booking_id)
            .await
            .map_err(store_error)
    }

    async fn list_bookings(&self, user_id: Option<DbId>) -> Result<Vec<Booking>, StoreError> {
        BookingRepo::list(&self.pool, user_id)
            .await
            .map_err(store_error)
    }

    async fn list_seats(
        &self,
        event_id: DbId,
        status: Option<SeatStatus>,
    ) -> Result<Vec<Seat>, StoreError> {
        SeatRepo::list_by_event(&self.pool, event_id, status)
            .await
            .map_err(store_error)
    }

    async fn create_event_with_seats(&self, input: &NewEvent) -> Result<Event, StoreError> {
        EventRepo::create_with_seats(&self.pool, input)
            .await
            .map_err(store_error)
    }
}

/// One booking transaction on PostgreSQL.
pub struct PgBookingTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingTx for PgBookingTx {
    async fn find_event(&mut self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        EventRepo::find_by_id(&mut *self.tx, event_id)
            .await
            .map_err(store_error)
    }

    async fn user_exists(&mut self, user_id: DbId) -> Result<bool, StoreError> {
        UserRepo::exists(&mut *self.tx, user_id)
            .await
            .map_err(store_error)
    }

    async fn find_active_booking(
        &mut self,
        user_id: DbId,
        event_id: DbId,
    ) -> Result<Option<Booking>, StoreError> {
        BookingRepo::find_active(&mut *self.tx, user_id, event_id)
            .await
            .map_err(store_error)
    }

    async fn reserve_seat(
        &mut self,
        event_id: DbId,
        seat_id: DbId,
    ) -> Result<Option<Seat>, StoreError> {
        SeatRepo::reserve(&mut *self.tx, event_id, seat_id)
            .await
            .map_err(store_error)
    }

    async fn release_seat(&mut self, seat_id: DbId) -> Result<(), StoreError> {
        SeatRepo::release(&mut *self.tx, seat_id)
            .await
            .map_err(store_error)
    }

    async fn insert_booking(&mut self, input: &NewBooking) -> Result<Booking, StoreError> {
        BookingRepo::insert(&mut *self.tx, input)
            .await
            .map_err(store_error)
    }

    async fn lock_booking(&mut self, booking_id: DbId) -> Result<Option<Booking>, StoreError> {
        BookingRepo::lock(&mut *self.tx, booking_id)
            .await
            .map_err(store_error)
    }

    async fn cancel_booking(&mut self, booking_id: DbId) -> Result<Option<Booking>, StoreError> {
        BookingRepo::cancel(&mut *self.tx, booking_id)
            .await
            .map_err(store_error)
    }

    async fn decrement_available(&mut self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        EventRepo::decrement_available(&mut *self.tx, event_id)
            .await
            .map_err(store_error)
    }

    async fn increment_available(&mut self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        EventRepo::increment_available(&mut *self.tx, event_id)
            .await
            .map_err(store_error)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(store_error)
    }
}
