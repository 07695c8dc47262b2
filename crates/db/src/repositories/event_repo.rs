//! Repository for the `events` table.
//!
//! The `available_seats` counter is only ever changed through
//! [`EventRepo::decrement_available`] and [`EventRepo::increment_available`],
//! each a single conditional `UPDATE` so concurrent bookings cannot lose an
//! update or push the counter outside `0..=total_seats`.

use boxoffice_core::catalog::{Event, NewEvent};
use boxoffice_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::event::{EventListQuery, EventPage, EventRow, PageMeta, UpdateEvent};
use crate::repositories::SeatRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, description, image_url, start_date, end_date, venue_id, \
    total_seats, available_seats, status, created_at, updated_at";

/// Filter shared by the page and count queries of [`EventRepo::list`].
const LIST_FILTER: &str =
    "($1::TEXT IS NULL OR title ILIKE $1) AND ($2::TEXT IS NULL OR status = $2)";

fn into_event(row: Option<EventRow>) -> Result<Option<Event>, sqlx::Error> {
    row.map(Event::try_from).transpose()
}

/// Provides catalog and counter operations for events.
pub struct EventRepo;

impl EventRepo {
    /// Insert an event and generate all of its seats in one transaction.
    ///
    /// The event starts with `available_seats = total_seats`. If seat
    /// generation fails the event row is rolled back with it.
    pub async fn create_with_seats(pool: &PgPool, input: &NewEvent) -> Result<Event, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO events
                (title, description, image_url, start_date, end_date, venue_id,
                 total_seats, available_seats, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7, COALESCE($8, 'published'))
             RETURNING {COLUMNS}"
        );
        let event: Event = sqlx::query_as::<_, EventRow>(&query)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.image_url)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.venue_id)
            .bind(input.total_seats)
            .bind(input.status.map(|s| s.as_str()))
            .fetch_one(&mut *tx)
            .await?
            .try_into()?;

        let generated = SeatRepo::generate_for_event(&mut tx, event.id, event.total_seats).await?;
        tracing::debug!(event_id = event.id, generated, "Generated seats for event");

        tx.commit().await?;
        Ok(event)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Event>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query_as::<_, EventRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        into_event(row)
    }

    /// One page of events ordered by start date, with the total match count.
    pub async fn list(pool: &PgPool, params: &EventListQuery) -> Result<EventPage, sqlx::Error> {
        let pattern = params.search_pattern();
        let status = params.status.map(|s| s.as_str());
        let (page, limit) = (params.page(), params.limit());

        let query = format!(
            "SELECT {COLUMNS} FROM events
             WHERE {LIST_FILTER}
             ORDER BY start_date ASC, id ASC
             LIMIT $3 OFFSET $4"
        );
        let events = sqlx::query_as::<_, EventRow>(&query)
            .bind(&pattern)
            .bind(status)
            .bind(limit)
            .bind(params.offset())
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Event::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM events WHERE {LIST_FILTER}"))
                .bind(&pattern)
                .bind(status)
                .fetch_one(pool)
                .await?;

        Ok(EventPage {
            events,
            meta: PageMeta::new(total, page, limit),
        })
    }

    /// Update an event's descriptive fields. Only non-`None` fields in
    /// `input` are applied; `venue_id: Some(None)` clears the venue.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEvent,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                image_url = COALESCE($4, image_url),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date),
                venue_id = CASE WHEN $9 THEN $7 ELSE venue_id END,
                status = COALESCE($8, status)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, EventRow>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.image_url)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.venue_id.flatten())
            .bind(input.status.map(|s| s.as_str()))
            .bind(input.venue_id.is_some())
            .fetch_optional(pool)
            .await?;
        into_event(row)
    }

    /// Delete an event. Its seats and bookings go with it (`ON DELETE CASCADE`).
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take one seat off the counter. `None` if the event is missing or sold out.
    pub async fn decrement_available<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Event>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE events SET available_seats = available_seats - 1
             WHERE id = $1 AND available_seats > 0
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, EventRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        into_event(row)
    }

    /// Put one seat back on the counter. `None` if the event is missing or
    /// already at capacity.
    pub async fn increment_available<'e, E>(
        executor: E,
        id: DbId,
    ) -> Result<Option<Event>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE events SET available_seats = available_seats + 1
             WHERE id = $1 AND available_seats < total_seats
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, EventRow>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        into_event(row)
    }
}
