use std::sync::Arc;

use boxoffice_core::lifecycle::BookingService;
use boxoffice_db::store::PgBookingStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is a pool handle or behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: boxoffice_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Booking lifecycle over PostgreSQL, notifying through `event_bus`.
    pub bookings: BookingService<PgBookingStore>,
    /// Event bus carrying booking notifications to background services.
    pub event_bus: Arc<boxoffice_events::EventBus>,
}

impl AppState {
    /// Wire the booking service to the pool and the event bus.
    pub fn new(
        pool: boxoffice_db::DbPool,
        config: ServerConfig,
        event_bus: Arc<boxoffice_events::EventBus>,
    ) -> Self {
        let bookings = BookingService::new(
            Arc::new(PgBookingStore::new(pool.clone())),
            event_bus.clone(),
        );
        Self {
            pool,
            config: Arc::new(config),
            bookings,
            event_bus,
        }
    }
}
