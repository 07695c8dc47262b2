//! Event catalog domain types.
//!
//! An event owns a fixed pool of seats generated at creation time. The
//! `available_seats` counter is a cached aggregate of that pool and is only
//! ever changed by the booking lifecycle.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::status::EventStatus;
use crate::types::{DbId, Timestamp};

/// Upper bound on seats generated for a single event.
pub const MAX_SEATS_PER_EVENT: i32 = 100_000;

/// An event with its seat counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub venue_id: Option<DbId>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub status: EventStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    pub fn is_sold_out(&self) -> bool {
        self.available_seats <= 0
    }
}

/// Input for creating an event together with its seats.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_event_window"))]
pub struct NewEvent {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub venue_id: Option<DbId>,
    #[validate(range(min = 1, max = MAX_SEATS_PER_EVENT))]
    pub total_seats: i32,
    #[serde(default)]
    pub status: Option<EventStatus>,
}

fn validate_event_window(event: &NewEvent) -> Result<(), ValidationError> {
    if event.end_date < event.start_date {
        let mut err = ValidationError::new("event_window");
        err.message = Some("end_date must not be before start_date".into());
        return Err(err);
    }
    Ok(())
}
