//! Repository for the `seats` table.

use boxoffice_core::inventory::{seat_layout, Seat};
use boxoffice_core::status::SeatStatus;
use boxoffice_core::types::DbId;
use sqlx::{PgExecutor, Postgres, Transaction};

use crate::models::seat::SeatRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, event_id, section, \"row\", number, status, created_at, updated_at";

/// Provides seat generation, listing and status transitions.
pub struct SeatRepo;

impl SeatRepo {
    /// Insert the generated layout for a new event within an existing
    /// transaction. Every seat starts `available`.
    pub async fn generate_for_event(
        tx: &mut Transaction<'_, Postgres>,
        event_id: DbId,
        total_seats: i32,
    ) -> Result<u64, sqlx::Error> {
        let layout = seat_layout(total_seats);
        let mut sections = Vec::with_capacity(layout.len());
        let mut rows = Vec::with_capacity(layout.len());
        let mut numbers = Vec::with_capacity(layout.len());
        for label in layout {
            sections.push(label.section);
            rows.push(label.row);
            numbers.push(label.number);
        }

        let result = sqlx::query(
            "INSERT INTO seats (event_id, section, \"row\", number)
             SELECT $1, section, seat_row, number
             FROM UNNEST($2::TEXT[], $3::TEXT[], $4::TEXT[])
                  WITH ORDINALITY AS layout(section, seat_row, number, position)
             ORDER BY position",
        )
        .bind(event_id)
        .bind(&sections)
        .bind(&rows)
        .bind(&numbers)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Seats of an event ordered by id, optionally filtered by status.
    pub async fn list_by_event<'e, E>(
        executor: E,
        event_id: DbId,
        status: Option<SeatStatus>,
    ) -> Result<Vec<Seat>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM seats
             WHERE event_id = $1 AND ($2::TEXT IS NULL OR status = $2)
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, SeatRow>(&query)
            .bind(event_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(executor)
            .await?
            .into_iter()
            .map(Seat::try_from)
            .collect()
    }

    /// Transition a seat `available -> booked` in a single statement.
    ///
    /// Returns `None` when the seat does not exist, belongs to a different
    /// event, or is already booked. Of two concurrent callers the second
    /// blocks on the row lock and then matches nothing.
    pub async fn reserve<'e, E>(
        executor: E,
        event_id: DbId,
        seat_id: DbId,
    ) -> Result<Option<Seat>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE seats SET status = 'booked'
             WHERE id = $1 AND event_id = $2 AND status = 'available'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SeatRow>(&query)
            .bind(seat_id)
            .bind(event_id)
            .fetch_optional(executor)
            .await?
            .map(Seat::try_from)
            .transpose()
    }

    /// Set a seat back to `available`.
    pub async fn release<'e, E>(executor: E, seat_id: DbId) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("UPDATE seats SET status = 'available' WHERE id = $1")
            .bind(seat_id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
