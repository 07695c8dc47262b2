//! Notification port for booking lifecycle events.
//!
//! Notifications are fire-and-forget: [`Notifier::notify`] is synchronous,
//! must not block, and cannot fail the operation that triggered it.

use std::sync::Mutex;

use serde::Serialize;

use crate::booking::Booking;
use crate::types::DbId;

/// What happened to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingConfirmed,
    BookingCancelled,
}

impl NotificationKind {
    /// Dot-separated event name used on the event bus.
    pub fn event_type(self) -> &'static str {
        match self {
            NotificationKind::BookingConfirmed => "booking.confirmed",
            NotificationKind::BookingCancelled => "booking.cancelled",
        }
    }
}

/// Payload handed to the notifier after a committed create or cancel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingNotification {
    pub kind: NotificationKind,
    pub user_id: DbId,
    pub booking_id: DbId,
    pub event_id: DbId,
    pub booking_code: String,
}

impl BookingNotification {
    pub fn new(kind: NotificationKind, booking: &Booking) -> Self {
        Self {
            kind,
            user_id: booking.user_id,
            booking_id: booking.id,
            event_id: booking.event_id,
            booking_code: booking.booking_code.clone(),
        }
    }
}

/// Receives booking lifecycle notifications for out-of-band delivery.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: BookingNotification);
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: BookingNotification) {}
}

/// Keeps every notification in memory. Intended for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<BookingNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the notifications received so far, oldest first.
    pub fn received(&self) -> Vec<BookingNotification> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: BookingNotification) {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}
