//! Seat row model.

use boxoffice_core::inventory::Seat;
use boxoffice_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::decode_status;

/// A seat row from the `seats` table.
#[derive(Debug, Clone, FromRow)]
pub struct SeatRow {
    pub id: DbId,
    pub event_id: DbId,
    pub section: String,
    pub row: String,
    pub number: String,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<SeatRow> for Seat {
    type Error = sqlx::Error;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        Ok(Seat {
            id: row.id,
            event_id: row.event_id,
            section: row.section,
            row: row.row,
            number: row.number,
            status: decode_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
