//! Box office event bus and notification delivery.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`. It implements the booking lifecycle's
//!   [`Notifier`](boxoffice_core::lifecycle::Notifier) port.
//! - [`PlatformEvent`] -- the event envelope carried on the bus.
//! - [`NotificationDispatcher`] -- background task that delivers booking
//!   notifications out of band.

pub mod bus;
pub mod dispatcher;

pub use bus::{EventBus, PlatformEvent};
pub use dispatcher::NotificationDispatcher;
