//! Row types and DTOs.
//!
//! Tables whose rows carry a status are read into a `*Row` struct first and
//! converted into the matching `boxoffice_core` type, so an unexpected status
//! literal surfaces as [`sqlx::Error::Decode`] instead of a panic.

pub mod booking;
pub mod event;
pub mod seat;
pub mod user;
pub mod venue;

use std::str::FromStr;

use boxoffice_core::status::UnknownStatus;

/// Parse a stored status literal.
pub(crate) fn decode_status<T>(value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = UnknownStatus>,
{
    value.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
