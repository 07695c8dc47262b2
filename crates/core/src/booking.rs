//! Booking records and booking-code generation.

use rand::Rng;
use serde::Serialize;

use crate::status::BookingStatus;
use crate::types::{DbId, Timestamp};

/// Prefix shared by every booking code.
pub const BOOKING_CODE_PREFIX: &str = "BK-";

/// Random bytes behind each code (rendered as two hex characters per byte).
const BOOKING_CODE_BYTES: usize = 6;

/// A user's claim on one seat for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    pub id: DbId,
    pub user_id: DbId,
    pub event_id: DbId,
    pub seat_id: DbId,
    pub booking_code: String,
    pub status: BookingStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// A booking is active while it is confirmed.
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

/// Values for inserting a confirmed booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub user_id: DbId,
    pub event_id: DbId,
    pub seat_id: DbId,
    pub booking_code: String,
}

/// Generate a random booking code such as `BK-3FA29C01B7E4`.
///
/// Uniqueness is ultimately enforced by the `uq_bookings_booking_code`
/// constraint; a collision is retried by the caller.
pub fn generate_booking_code() -> String {
    let bytes: [u8; BOOKING_CODE_BYTES] = rand::rng().random();
    let mut code = String::with_capacity(BOOKING_CODE_PREFIX.len() + BOOKING_CODE_BYTES * 2);
    code.push_str(BOOKING_CODE_PREFIX);
    for byte in bytes {
        code.push_str(&format!("{byte:02X}"));
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn code_has_prefix_and_fixed_length() {
        let code = generate_booking_code();
        assert!(code.starts_with(BOOKING_CODE_PREFIX));
        assert_eq!(code.len(), BOOKING_CODE_PREFIX.len() + 12);
    }

    #[test]
    fn code_suffix_is_uppercase_hex() {
        let code = generate_booking_code();
        let suffix = &code[BOOKING_CODE_PREFIX.len()..];
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }

    #[test]
    fn codes_do_not_repeat_in_practice() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_booking_code()).collect();
        assert_eq!(codes.len(), 1000);
    }
}
