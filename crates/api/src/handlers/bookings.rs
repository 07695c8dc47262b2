//! Handlers for the `/bookings` resource.
//!
//! Every route requires an authenticated user. Creation and cancellation run
//! through the booking lifecycle in [`AppState::bookings`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use boxoffice_core::booking::Booking;
use boxoffice_core::error::CoreError;
use boxoffice_core::types::DbId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::BookingListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /bookings`.
#[derive(Debug, Deserialize)]
pub struct CreateBooking {
    pub event_id: DbId,
    pub seat_id: DbId,
}

/// GET /api/v1/bookings
///
/// The caller's own bookings, newest first. Admins may pass `?all=true` to
/// list every booking.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<BookingListParams>,
) -> AppResult<Json<DataResponse<Vec<Booking>>>> {
    let owner = if params.all {
        if !auth.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required to list all bookings".into(),
            )));
        }
        None
    } else {
        Some(auth.user_id)
    };

    let bookings = state.bookings.list_bookings(owner).await?;
    Ok(Json(DataResponse { data: bookings }))
}

/// POST /api/v1/bookings
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<DataResponse<Booking>>)> {
    let booking = state
        .bookings
        .create_booking(auth.user_id, input.event_id, input.seat_id)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: booking })))
}

/// GET /api/v1/bookings/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = state.bookings.get_booking(id).await?;
    if booking.user_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only view your own bookings".into(),
        )));
    }
    Ok(Json(DataResponse { data: booking }))
}

/// PATCH /api/v1/bookings/{id}/cancel
pub async fn cancel(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Booking>>> {
    let booking = state.bookings.cancel_booking(id, auth.user_id).await?;
    Ok(Json(DataResponse { data: booking }))
}
