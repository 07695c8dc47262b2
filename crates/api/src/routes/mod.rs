pub mod bookings;
pub mod events;
pub mod health;
pub mod venues;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /bookings                        list, create (requires auth)
/// /bookings/{id}                   get (owner or admin)
/// /bookings/{id}/cancel            cancel (owner)
///
/// /events                          list (public), create (admin)
/// /events/{id}                     get (public), update, delete (admin)
/// /events/{id}/seats               seat map (public)
///
/// /venues                          list (public), create (admin)
/// /venues/{id}                     get (public), update, delete (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/bookings", bookings::router())
        .nest("/events", events::router())
        .nest("/venues", venues::router())
}
