//! Handlers for the `/events` resource.
//!
//! Creation goes through the booking service so the event and its seats are
//! written in one transaction. Updates only touch descriptive fields.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use boxoffice_core::catalog::{Event, NewEvent};
use boxoffice_core::error::CoreError;
use boxoffice_core::inventory::Seat;
use boxoffice_core::types::DbId;
use boxoffice_db::models::event::{EventListQuery, UpdateEvent};
use boxoffice_db::repositories::{EventRepo, VenueRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::SeatListParams;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn event_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Event", id })
}

/// Verify that a referenced venue exists.
async fn ensure_venue_exists(pool: &sqlx::PgPool, venue_id: Option<DbId>) -> AppResult<()> {
    let Some(id) = venue_id else {
        return Ok(());
    };
    VenueRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Venue", id }))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/events?page=&limit=&search=&status=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<EventListQuery>,
) -> AppResult<Json<PaginatedResponse<Event>>> {
    let page = EventRepo::list(&state.pool, &params).await?;
    Ok(Json(PaginatedResponse {
        data: page.events,
        meta: page.meta,
    }))
}

/// POST /api/v1/events
///
/// Creates the event and all `total_seats` seats, or nothing.
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<NewEvent>,
) -> AppResult<(StatusCode, Json<DataResponse<Event>>)> {
    input.validate()?;
    ensure_venue_exists(&state.pool, input.venue_id).await?;

    let event = state.bookings.create_event_with_seats(&input).await?;
    tracing::info!(event_id = event.id, user_id = admin.user_id, "Event created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}

/// GET /api/v1/events/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Event>>> {
    let event = EventRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| event_not_found(id))?;
    Ok(Json(DataResponse { data: event }))
}

/// PATCH /api/v1/events/{id}
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateEvent>,
) -> AppResult<Json<DataResponse<Event>>> {
    input.validate()?;

    let existing = EventRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| event_not_found(id))?;
    let start = input.start_date.unwrap_or(existing.start_date);
    let end = input.end_date.unwrap_or(existing.end_date);
    if end < start {
        return Err(AppError::Core(CoreError::Validation(
            "end_date must not be before start_date".into(),
        )));
    }
    ensure_venue_exists(&state.pool, input.venue_id.flatten()).await?;

    let event = EventRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| event_not_found(id))?;
    Ok(Json(DataResponse { data: event }))
}

/// DELETE /api/v1/events/{id}
///
/// Seats and bookings of the event are removed with it.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if EventRepo::delete(&state.pool, id).await? {
        tracing::info!(event_id = id, user_id = admin.user_id, "Event deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(event_not_found(id))
    }
}

/// GET /api/v1/events/{id}/seats?status=
pub async fn seats(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<SeatListParams>,
) -> AppResult<Json<DataResponse<Vec<Seat>>>> {
    let seats = state.bookings.event_seats(id, params.status).await?;
    Ok(Json(DataResponse { data: seats }))
}
