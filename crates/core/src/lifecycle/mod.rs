//! Booking lifecycle: the seat reservation state machine, its storage port,
//! and the notification port it reports to.

mod error;
pub mod memory;
pub mod notify;
pub mod port;
mod service;

pub use error::{BookingError, ErrorKind};
pub use memory::{FailPoint, InMemoryStore};
pub use notify::{BookingNotification, NoopNotifier, NotificationKind, Notifier, RecordingNotifier};
pub use port::{BookingStore, BookingTx, StoreError};
pub use service::{BookingService, MAX_CODE_ATTEMPTS};
