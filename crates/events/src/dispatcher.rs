//! Out-of-band delivery of booking notifications.
//!
//! [`NotificationDispatcher`] subscribes to the [`EventBus`](crate::EventBus)
//! and turns booking events into deliveries for the affected user. There is
//! no external channel yet, so a delivery is a structured log line. The loop
//! runs until the bus closes or its [`CancellationToken`] fires.

use boxoffice_core::lifecycle::NotificationKind;
use boxoffice_core::types::DbId;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::PlatformEvent;

/// A message addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub kind: NotificationKind,
    pub user_id: DbId,
    pub booking_code: String,
}

impl Delivery {
    /// The delivery a bus event calls for, if any.
    ///
    /// Only `booking.confirmed` and `booking.cancelled` events with an actor
    /// are delivered; everything else is ignored.
    pub fn from_event(event: &PlatformEvent) -> Option<Self> {
        let kind = [
            NotificationKind::BookingConfirmed,
            NotificationKind::BookingCancelled,
        ]
        .into_iter()
        .find(|kind| kind.event_type() == event.event_type)?;

        Some(Self {
            kind,
            user_id: event.actor_user_id?,
            booking_code: event.payload["booking_code"].as_str()?.to_string(),
        })
    }

    pub fn subject(&self) -> &'static str {
        match self.kind {
            NotificationKind::BookingConfirmed => "Your booking is confirmed",
            NotificationKind::BookingCancelled => "Your booking was cancelled",
        }
    }
}

/// Background service that delivers booking notifications.
#[derive(Debug, Default)]
pub struct NotificationDispatcher;

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Run the delivery loop. Returns how many deliveries were made.
    pub async fn run(
        &self,
        mut receiver: broadcast::Receiver<PlatformEvent>,
        cancel: CancellationToken,
    ) -> u64 {
        let mut delivered = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(delivered, "Notification dispatcher cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        if let Some(delivery) = Delivery::from_event(&event) {
                            self.deliver(&delivery);
                            delivered += 1;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            skipped = n,
                            "Notification dispatcher lagged, some notifications were not delivered",
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!(
                            delivered,
                            "Event bus closed, notification dispatcher shutting down",
                        );
                        break;
                    }
                },
            }
        }
        delivered
    }

    fn deliver(&self, delivery: &Delivery) {
        tracing::info!(
            user_id = delivery.user_id,
            booking_code = %delivery.booking_code,
            subject = delivery.subject(),
            "Sending booking notification",
        );
    }
}
