//! Handlers for the `/venues` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use boxoffice_core::error::CoreError;
use boxoffice_core::types::DbId;
use boxoffice_db::models::venue::{CreateVenue, UpdateVenue, Venue};
use boxoffice_db::repositories::VenueRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

fn venue_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Venue", id })
}

/// POST /api/v1/venues
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateVenue>,
) -> AppResult<(StatusCode, Json<DataResponse<Venue>>)> {
    input.validate()?;
    let venue = VenueRepo::create(&state.pool, &input).await?;
    tracing::info!(venue_id = venue.id, user_id = admin.user_id, "Venue created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: venue })))
}

/// GET /api/v1/venues
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Venue>>>> {
    let venues = VenueRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: venues }))
}

/// GET /api/v1/venues/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Venue>>> {
    let venue = VenueRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| venue_not_found(id))?;
    Ok(Json(DataResponse { data: venue }))
}

/// PATCH /api/v1/venues/{id}
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateVenue>,
) -> AppResult<Json<DataResponse<Venue>>> {
    input.validate()?;
    let venue = VenueRepo::update(&state.pool, id, &input)
        .await?
        .ok_or_else(|| venue_not_found(id))?;
    Ok(Json(DataResponse { data: venue }))
}

/// DELETE /api/v1/venues/{id}
///
/// Events held at the venue are kept and lose their `venue_id`.
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if VenueRepo::delete(&state.pool, id).await? {
        tracing::info!(venue_id = id, user_id = admin.user_id, "Venue deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(venue_not_found(id))
    }
}
