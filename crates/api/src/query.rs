//! Shared query parameter types for API handlers.

use boxoffice_core::status::SeatStatus;
use serde::Deserialize;

/// `GET /bookings?all=true` -- admins may list every booking.
#[derive(Debug, Default, Deserialize)]
pub struct BookingListParams {
    #[serde(default)]
    pub all: bool,
}

/// `GET /events/{id}/seats?status=available|booked`.
#[derive(Debug, Default, Deserialize)]
pub struct SeatListParams {
    pub status: Option<SeatStatus>,
}
