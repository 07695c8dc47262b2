//! Lifecycle status enums for events, seats and bookings.
//!
//! Statuses are stored as lowercase `TEXT` values guarded by `CHECK`
//! constraints. Each enum round-trips through [`as_str`](EventStatus::as_str)
//! and [`FromStr`](std::str::FromStr) with the exact database literal.

use serde::{Deserialize, Serialize};

/// Returned when a stored status literal has no matching enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} status: {value:?}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! define_text_status {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident = $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The database literal for this status.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(UnknownStatus {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

define_text_status! {
    /// Event publication status.
    EventStatus ("event") {
        Draft = "draft",
        Published = "published",
        Cancelled = "cancelled",
    }
}

define_text_status! {
    /// Seat occupancy status.
    SeatStatus ("seat") {
        Available = "available",
        Booked = "booked",
    }
}

define_text_status! {
    /// Booking status. `Cancelled` is terminal.
    BookingStatus ("booking") {
        Confirmed = "confirmed",
        Cancelled = "cancelled",
    }
}

impl Default for EventStatus {
    fn default() -> Self {
        EventStatus::Published
    }
}
