//! Repository for the `bookings` table.
//!
//! Every method takes a [`PgExecutor`] so the booking lifecycle can run them
//! inside its transaction while read-only handlers pass the pool.

use boxoffice_core::booking::{Booking, NewBooking};
use boxoffice_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::booking::BookingRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, user_id, event_id, seat_id, booking_code, status, created_at, updated_at";

fn into_booking(row: Option<BookingRow>) -> Result<Option<Booking>, sqlx::Error> {
    row.map(Booking::try_from).transpose()
}

/// Provides booking inserts, lookups and the cancel transition.
pub struct BookingRepo;

impl BookingRepo {
    /// Insert a `confirmed` booking.
    ///
    /// Fails with a unique violation on `uq_bookings_booking_code`,
    /// `uq_bookings_active_seat` or `uq_bookings_active_user_event`.
    pub async fn insert<'e, E>(executor: E, input: &NewBooking) -> Result<Booking, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO bookings (user_id, event_id, seat_id, booking_code, status)
             VALUES ($1, $2, $3, $4, 'confirmed')
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BookingRow>(&query)
            .bind(input.user_id)
            .bind(input.event_id)
            .bind(input.seat_id)
            .bind(&input.booking_code)
            .fetch_one(executor)
            .await?
            .try_into()
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Booking>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        into_booking(row)
    }

    /// Load a booking with `FOR UPDATE`, holding its row lock until the
    /// surrounding transaction ends.
    pub async fn lock<'e, E>(executor: E, id: DbId) -> Result<Option<Booking>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        into_booking(row)
    }

    /// The confirmed booking a user holds for an event, if any.
    pub async fn find_active<'e, E>(
        executor: E,
        user_id: DbId,
        event_id: DbId,
    ) -> Result<Option<Booking>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings
             WHERE user_id = $1 AND event_id = $2 AND status = 'confirmed'"
        );
        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(user_id)
            .bind(event_id)
            .fetch_optional(executor)
            .await?;
        into_booking(row)
    }

    /// Transition `confirmed -> cancelled`. `None` if the booking is missing
    /// or already cancelled.
    pub async fn cancel<'e, E>(executor: E, id: DbId) -> Result<Option<Booking>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE bookings SET status = 'cancelled'
             WHERE id = $1 AND status = 'confirmed'
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, BookingRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        into_booking(row)
    }

    /// All bookings, or only those of `user_id`. Newest first.
    pub async fn list<'e, E>(
        executor: E,
        user_id: Option<DbId>,
    ) -> Result<Vec<Booking>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM bookings
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, BookingRow>(&query)
            .bind(user_id)
            .fetch_all(executor)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }
}
