//! Route definitions for the `/venues` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::venues;
use crate::state::AppState;

/// Routes mounted at `/venues`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create
/// GET    /{id}          -> get_by_id
/// PATCH  /{id}          -> update
/// DELETE /{id}          -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(venues::list).post(venues::create))
        .route(
            "/{id}",
            get(venues::get_by_id)
                .patch(venues::update)
                .delete(venues::delete),
        )
}
