//! Seat inventory domain types and seat generation.

use serde::Serialize;

use crate::status::SeatStatus;
use crate::types::{DbId, Timestamp};

/// Section name assigned to generated seats.
pub const DEFAULT_SECTION: &str = "General";

/// Seats per generated row.
pub const SEATS_PER_ROW: i32 = 10;

/// A single seat belonging to exactly one event.
///
/// `section`, `row` and `number` are display labels; conflicts are detected
/// on `id` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seat {
    pub id: DbId,
    pub event_id: DbId,
    pub section: String,
    pub row: String,
    pub number: String,
    pub status: SeatStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Seat {
    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }
}

/// Display labels for a seat that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatLabel {
    pub section: String,
    pub row: String,
    pub number: String,
}

/// Generate labels for `total_seats` seats.
///
/// Seat `i` (1-based) is placed in [`DEFAULT_SECTION`], row `ceil(i / 10)`,
/// number `i`. Non-positive counts produce no seats.
///
/// ```
/// use boxoffice_core::inventory::seat_layout;
///
/// let seats = seat_layout(11);
/// assert_eq!(seats.len(), 11);
/// assert_eq!(seats[9].row, "1");
/// assert_eq!(seats[10].row, "2");
/// ```
pub fn seat_layout(total_seats: i32) -> Vec<SeatLabel> {
    (1..=total_seats.max(0))
        .map(|i| SeatLabel {
            section: DEFAULT_SECTION.to_string(),
            row: ((i + SEATS_PER_ROW - 1) / SEATS_PER_ROW).to_string(),
            number: i.to_string(),
        })
        .collect()
}
