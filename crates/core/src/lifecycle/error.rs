use crate::error::CoreError;
use crate::types::DbId;

use super::port::StoreError;

/// Broad category of a [`BookingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Forbidden,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code for the kind.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::InvalidInput => "VALIDATION_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Failures of the booking lifecycle.
///
/// Every variant is a per-request, recoverable failure. Storage details are
/// never carried in the message of [`BookingError::Internal`] shown to callers;
/// see [`BookingError::public_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Event #{0} not found")]
    EventNotFound(DbId),

    #[error("User #{0} not found")]
    UserNotFound(DbId),

    #[error("Booking #{0} not found")]
    BookingNotFound(DbId),

    #[error("Seat is not available")]
    SeatUnavailable { seat_id: DbId },

    #[error("You already have an active booking for this event")]
    DuplicateActiveBooking { user_id: DbId, event_id: DbId },

    #[error("No seats left for this event")]
    NoSeatsLeft { event_id: DbId },

    #[error("Booking is already cancelled")]
    AlreadyCancelled { booking_id: DbId },

    #[error("You can only cancel your own bookings")]
    NotOwner { booking_id: DbId },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::EventNotFound(_)
            | BookingError::UserNotFound(_)
            | BookingError::BookingNotFound(_) => ErrorKind::NotFound,
            BookingError::SeatUnavailable { .. }
            | BookingError::DuplicateActiveBooking { .. }
            | BookingError::NoSeatsLeft { .. }
            | BookingError::AlreadyCancelled { .. } => ErrorKind::Conflict,
            BookingError::NotOwner { .. } => ErrorKind::Forbidden,
            BookingError::InvalidInput(_) => ErrorKind::InvalidInput,
            BookingError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for this specific failure.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::EventNotFound(_) => "EVENT_NOT_FOUND",
            BookingError::UserNotFound(_) => "USER_NOT_FOUND",
            BookingError::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            BookingError::SeatUnavailable { .. } => "SEAT_UNAVAILABLE",
            BookingError::DuplicateActiveBooking { .. } => "DUPLICATE_ACTIVE_BOOKING",
            BookingError::NoSeatsLeft { .. } => "NO_SEATS_LEFT",
            BookingError::AlreadyCancelled { .. } => "ALREADY_CANCELLED",
            BookingError::NotOwner { .. } => "NOT_OWNER",
            BookingError::InvalidInput(_) => "INVALID_INPUT",
            BookingError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Human-readable message safe to return to a caller.
    pub fn public_message(&self) -> String {
        match self {
            BookingError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        BookingError::Internal(err.to_string())
    }
}

impl From<BookingError> for CoreError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::EventNotFound(id) => CoreError::NotFound { entity: "Event", id },
            BookingError::UserNotFound(id) => CoreError::NotFound { entity: "User", id },
            BookingError::BookingNotFound(id) => CoreError::NotFound { entity: "Booking", id },
            BookingError::NotOwner { .. } => CoreError::Forbidden(err.to_string()),
            BookingError::InvalidInput(msg) => CoreError::Validation(msg),
            BookingError::Internal(msg) => CoreError::Internal(msg),
            conflict => CoreError::Conflict(conflict.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn conflicts_share_a_kind() {
        let errors = [
            BookingError::SeatUnavailable { seat_id: 1 },
            BookingError::DuplicateActiveBooking { user_id: 1, event_id: 2 },
            BookingError::NoSeatsLeft { event_id: 2 },
            BookingError::AlreadyCancelled { booking_id: 3 },
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::Conflict, "{err}");
        }
    }

    #[test]
    fn seat_unavailable_message_is_stable() {
        let err = BookingError::SeatUnavailable { seat_id: 9 };
        assert_eq!(err.to_string(), "Seat is not available");
        assert_eq!(err.code(), "SEAT_UNAVAILABLE");
    }

    #[test]
    fn internal_message_is_sanitized() {
        let err = BookingError::Internal("connection refused: 10.0.0.5:5432".into());
        assert_eq!(err.public_message(), "An internal error occurred");
        assert_eq!(err.kind().code(), "INTERNAL_ERROR");
    }

    #[test]
    fn converts_into_core_error() {
        assert_matches!(
            CoreError::from(BookingError::EventNotFound(4)),
            CoreError::NotFound { entity: "Event", id: 4 }
        );
        assert_matches!(
            CoreError::from(BookingError::NotOwner { booking_id: 1 }),
            CoreError::Forbidden(_)
        );
        assert_matches!(
            CoreError::from(BookingError::AlreadyCancelled { booking_id: 1 }),
            CoreError::Conflict(msg) if msg == "Booking is already cancelled"
        );
    }
}
