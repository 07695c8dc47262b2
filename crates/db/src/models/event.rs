//! Event row, update DTO and list filters.
//!
//! Creation goes through [`boxoffice_core::catalog::NewEvent`] because it
//! also generates the event's seats.

use boxoffice_core::catalog::Event;
use boxoffice_core::status::EventStatus;
use boxoffice_core::types::{DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::decode_status;

/// Default page size for event listings.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// An event row from the `events` table.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub venue_id: Option<DbId>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<EventRow> for Event {
    type Error = sqlx::Error;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Event {
            id: row.id,
            title: row.title,
            description: row.description,
            image_url: row.image_url,
            start_date: row.start_date,
            end_date: row.end_date,
            venue_id: row.venue_id,
            total_seats: row.total_seats,
            available_seats: row.available_seats,
            status: decode_status(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// DTO for updating an event's descriptive fields. All fields are optional.
///
/// Seat counts are deliberately absent: `total_seats` is fixed at creation
/// and `available_seats` belongs to the booking lifecycle.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEvent {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    /// Absent leaves the venue alone; `null` detaches the event from it.
    #[serde(default, deserialize_with = "present")]
    pub venue_id: Option<Option<DbId>>,
    pub status: Option<EventStatus>,
}

/// Deserialize a field that was present in the body, `null` included.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Filters and paging for `GET /events` (`?page=&limit=&search=&status=`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub status: Option<EventStatus>,
}

impl EventListQuery {
    /// 1-based page number, at least 1.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip. Saturates for absurd page numbers, which then simply
    /// yield an empty page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// The search term wrapped for `ILIKE`, with wildcards escaped.
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{escaped}%"))
    }
}

/// Paging metadata returned next to a page of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// One page of events.
#[derive(Debug, Clone)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub meta: PageMeta,
}
