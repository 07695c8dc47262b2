//! Booking row model.

use boxoffice_core::booking::Booking;
use boxoffice_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::decode_status;

/// A booking row from the `bookings` table.
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: DbId,
    pub user_id: DbId,
    pub event_id: DbId,
    pub seat_id: DbId,
    pub booking_code: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<BookingRow> for Booking {
    type Error = sqlx::Error;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            event_id: row.event_id,
            seat_id: row.seat_id,
            booking_code: row.booking_code,
            status: decode_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
