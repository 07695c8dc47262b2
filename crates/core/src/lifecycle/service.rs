//! Booking lifecycle: create and cancel a booking against one seat.
//!
//! Per seat the lifecycle is a two-state machine, `Open` (seat available, no
//! confirmed booking) and `Reserved` (seat booked, exactly one confirmed
//! booking). Each transition runs inside a single [`BookingTx`], so the seat
//! status, the event's `available_seats` counter and the booking row change
//! together or not at all.

use std::sync::Arc;

use validator::Validate;

use crate::booking::{generate_booking_code, Booking, NewBooking};
use crate::catalog::{Event, NewEvent};
use crate::inventory::Seat;
use crate::status::{BookingStatus, SeatStatus};
use crate::types::DbId;

use super::error::BookingError;
use super::notify::{BookingNotification, NotificationKind, Notifier};
use super::port::{
    BookingStore, BookingTx, StoreError, UQ_ACTIVE_SEAT, UQ_ACTIVE_USER_EVENT, UQ_BOOKING_CODE,
};

/// How many fresh booking codes are tried before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 3;

/// Orchestrates bookings over a [`BookingStore`] and reports committed
/// transitions to a [`Notifier`].
pub struct BookingService<S: BookingStore> {
    store: Arc<S>,
    notifier: Arc<dyn Notifier>,
}

impl<S: BookingStore> Clone for BookingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<S: BookingStore> BookingService<S> {
    pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Reserve `seat_id` of `event_id` for `user_id`.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` / `UserNotFound` when either id is unknown.
    /// - `DuplicateActiveBooking` when the user already holds a confirmed
    ///   booking for the event.
    /// - `SeatUnavailable` when the seat is booked, missing, or belongs to a
    ///   different event.
    /// - `NoSeatsLeft` when the event counter is exhausted.
    /// - `Internal` on storage failure.
    pub async fn create_booking(
        &self,
        user_id: DbId,
        event_id: DbId,
        seat_id: DbId,
    ) -> Result<Booking, BookingError> {
        let result = self.create_with_fresh_codes(user_id, event_id, seat_id).await;
        log_internal("create_booking", &result);
        let booking = result?;

        tracing::info!(
            booking_id = booking.id,
            user_id,
            event_id,
            seat_id,
            booking_code = %booking.booking_code,
            "Booking confirmed",
        );
        self.notifier.notify(BookingNotification::new(
            NotificationKind::BookingConfirmed,
            &booking,
        ));

        Ok(booking)
    }

    /// Cancel `booking_id` on behalf of `user_id`, returning the seat to the
    /// pool.
    ///
    /// # Errors
    ///
    /// - `BookingNotFound` when the booking does not exist.
    /// - `NotOwner` when `user_id` did not make the booking.
    /// - `AlreadyCancelled` when the booking was cancelled before.
    /// - `Internal` on storage failure.
    pub async fn cancel_booking(
        &self,
        booking_id: DbId,
        user_id: DbId,
    ) -> Result<Booking, BookingError> {
        let result = self.cancel_in_tx(booking_id, user_id).await;
        log_internal("cancel_booking", &result);
        let booking = result?;

        tracing::info!(
            booking_id,
            user_id,
            event_id = booking.event_id,
            seat_id = booking.seat_id,
            "Booking cancelled",
        );
        self.notifier.notify(BookingNotification::new(
            NotificationKind::BookingCancelled,
            &booking,
        ));

        Ok(booking)
    }

    /// All bookings, or only those belonging to `user_id`.
    pub async fn list_bookings(&self, user_id: Option<DbId>) -> Result<Vec<Booking>, BookingError> {
        let result = self.store.list_bookings(user_id).await.map_err(BookingError::from);
        log_internal("list_bookings", &result);
        result
    }

    pub async fn get_booking(&self, booking_id: DbId) -> Result<Booking, BookingError> {
        let result = match self.store.find_booking(booking_id).await {
            Ok(Some(booking)) => Ok(booking),
            Ok(None) => Err(BookingError::BookingNotFound(booking_id)),
            Err(e) => Err(e.into()),
        };
        log_internal("get_booking", &result);
        result
    }

    /// Validate `input` and create the event with all of its seats.
    pub async fn create_event_with_seats(&self, input: &NewEvent) -> Result<Event, BookingError> {
        input
            .validate()
            .map_err(|e| BookingError::InvalidInput(e.to_string()))?;

        let result = self
            .store
            .create_event_with_seats(input)
            .await
            .map_err(BookingError::from);
        log_internal("create_event_with_seats", &result);
        let event = result?;

        tracing::info!(
            event_id = event.id,
            total_seats = event.total_seats,
            "Event created with seats",
        );
        Ok(event)
    }

    /// Seats of an existing event, optionally filtered by status.
    pub async fn event_seats(
        &self,
        event_id: DbId,
        status: Option<SeatStatus>,
    ) -> Result<Vec<Seat>, BookingError> {
        let result = self.seats_of_existing_event(event_id, status).await;
        log_internal("event_seats", &result);
        result
    }

    async fn seats_of_existing_event(
        &self,
        event_id: DbId,
        status: Option<SeatStatus>,
    ) -> Result<Vec<Seat>, BookingError> {
        self.store
            .find_event(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;
        Ok(self.store.list_seats(event_id, status).await?)
    }

    async fn create_with_fresh_codes(
        &self,
        user_id: DbId,
        event_id: DbId,
        seat_id: DbId,
    ) -> Result<Booking, BookingError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = generate_booking_code();
            match self.create_in_tx(user_id, event_id, seat_id, code).await? {
                Some(booking) => return Ok(booking),
                None => tracing::warn!(attempt, event_id, seat_id, "Booking code collision"),
            }
        }
        Err(BookingError::Internal(format!(
            "no unique booking code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    /// One attempt at a booking. `Ok(None)` means the code collided and the
    /// transaction was rolled back.
    async fn create_in_tx(
        &self,
        user_id: DbId,
        event_id: DbId,
        seat_id: DbId,
        booking_code: String,
    ) -> Result<Option<Booking>, BookingError> {
        let mut tx = self.store.begin().await?;

        tx.find_event(event_id)
            .await?
            .ok_or(BookingError::EventNotFound(event_id))?;

        if !tx.user_exists(user_id).await? {
            return Err(BookingError::UserNotFound(user_id));
        }

        if tx.find_active_booking(user_id, event_id).await?.is_some() {
            return Err(BookingError::DuplicateActiveBooking { user_id, event_id });
        }

        if tx.reserve_seat(event_id, seat_id).await?.is_none() {
            return Err(BookingError::SeatUnavailable { seat_id });
        }

        let input = NewBooking {
            user_id,
            event_id,
            seat_id,
            booking_code,
        };
        let booking = match tx.insert_booking(&input).await {
            Ok(booking) => booking,
            Err(StoreError::UniqueViolation(constraint)) => {
                return match constraint.as_str() {
                    UQ_BOOKING_CODE => Ok(None),
                    UQ_ACTIVE_SEAT => Err(BookingError::SeatUnavailable { seat_id }),
                    UQ_ACTIVE_USER_EVENT => {
                        Err(BookingError::DuplicateActiveBooking { user_id, event_id })
                    }
                    _ => Err(StoreError::UniqueViolation(constraint).into()),
                };
            }
            Err(e) => return Err(e.into()),
        };

        let event = tx
            .decrement_available(event_id)
            .await?
            .ok_or(BookingError::NoSeatsLeft { event_id })?;

        tx.commit().await?;
        if event.is_sold_out() {
            tracing::info!(event_id, "Event sold out");
        }
        Ok(Some(booking))
    }

    async fn cancel_in_tx(&self, booking_id: DbId, user_id: DbId) -> Result<Booking, BookingError> {
        let mut tx = self.store.begin().await?;

        let booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking_id))?;

        if booking.user_id != user_id {
            return Err(BookingError::NotOwner { booking_id });
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled { booking_id });
        }

        // Status flips first so a racing cancel observes AlreadyCancelled.
        let cancelled = tx
            .cancel_booking(booking_id)
            .await?
            .ok_or(BookingError::AlreadyCancelled { booking_id })?;

        tx.release_seat(booking.seat_id).await?;

        if tx.increment_available(booking.event_id).await?.is_none() {
            tracing::warn!(
                booking_id,
                event_id = booking.event_id,
                "Event missing or already at capacity while releasing a seat",
            );
        }

        tx.commit().await?;
        Ok(cancelled)
    }
}

fn log_internal<T>(operation: &'static str, result: &Result<T, BookingError>) {
    if let Err(BookingError::Internal(detail)) = result {
        tracing::error!(operation, error = %detail, "Booking storage failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::memory::{FailPoint, InMemoryStore};
    use crate::lifecycle::notify::RecordingNotifier;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    fn new_event(total_seats: i32) -> NewEvent {
        let start = Utc::now() + Duration::days(30);
        NewEvent {
            title: "Jazz Night".to_string(),
            description: None,
            image_url: None,
            start_date: start,
            end_date: start + Duration::hours(3),
            venue_id: None,
            total_seats,
            status: None,
        }
    }

    async fn setup(
        total_seats: i32,
    ) -> (
        BookingService<InMemoryStore>,
        Arc<RecordingNotifier>,
        Event,
        Vec<Seat>,
    ) {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let service = BookingService::new(Arc::clone(&store), notifier.clone());
        let event = service
            .create_event_with_seats(&new_event(total_seats))
            .await
            .unwrap();
        let seats = service.event_seats(event.id, None).await.unwrap();
        (service, notifier, event, seats)
    }

    #[tokio::test]
    async fn create_books_seat_and_decrements_counter() {
        let (service, _, event, seats) = setup(3).await;
        let user = service.store().add_user().await;

        let booking = service
            .create_booking(user, event.id, seats[0].id)
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.user_id, user);
        assert!(booking.booking_code.starts_with("BK-"));

        let event = service.store().find_event(event.id).await.unwrap().unwrap();
        assert_eq!(event.available_seats, 2);

        let booked = service
            .event_seats(event.id, Some(SeatStatus::Booked))
            .await
            .unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].id, seats[0].id);
    }

    #[tokio::test]
    async fn booking_last_seat_sells_out_event() {
        let (service, _, event, seats) = setup(1).await;
        let user = service.store().add_user().await;
        assert!(!event.is_sold_out());

        service
            .create_booking(user, event.id, seats[0].id)
            .await
            .unwrap();

        let event = service.store().find_event(event.id).await.unwrap().unwrap();
        assert_eq!(event.available_seats, 0);
        assert!(event.is_sold_out());
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let (service, _, _, seats) = setup(1).await;
        let user = service.store().add_user().await;

        let err = service.create_booking(user, 9999, seats[0].id).await.unwrap_err();
        assert_matches!(err, BookingError::EventNotFound(9999));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (service, _, event, seats) = setup(1).await;

        let err = service
            .create_booking(4242, event.id, seats[0].id)
            .await
            .unwrap_err();
        assert_matches!(err, BookingError::UserNotFound(4242));
    }

    #[tokio::test]
    async fn seat_from_another_event_is_unavailable() {
        let (service, _, event, _) = setup(2).await;
        let other = service
            .create_event_with_seats(&new_event(2))
            .await
            .unwrap();
        let other_seats = service.event_seats(other.id, None).await.unwrap();
        let user = service.store().add_user().await;

        let err = service
            .create_booking(user, event.id, other_seats[0].id)
            .await
            .unwrap_err();
        assert_matches!(err, BookingError::SeatUnavailable { .. });

        let other = service.store().find_event(other.id).await.unwrap().unwrap();
        assert_eq!(other.available_seats, 2);
    }

    #[tokio::test]
    async fn booking_code_collision_is_retried() {
        let (service, _, event, seats) = setup(1).await;
        let user = service.store().add_user().await;
        service.store().fail_times(FailPoint::BookingCodeCollision, 2);

        let booking = service
            .create_booking(user, event.id, seats[0].id)
            .await
            .unwrap();
        assert_eq!(booking.seat_id, seats[0].id);
    }

    #[tokio::test]
    async fn persistent_code_collision_gives_up_cleanly() {
        let (service, notifier, event, seats) = setup(1).await;
        let user = service.store().add_user().await;
        service
            .store()
            .fail_times(FailPoint::BookingCodeCollision, MAX_CODE_ATTEMPTS);

        let err = service
            .create_booking(user, event.id, seats[0].id)
            .await
            .unwrap_err();
        assert_matches!(err, BookingError::Internal(_));

        let available = service
            .event_seats(event.id, Some(SeatStatus::Available))
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert!(notifier.received().is_empty());
    }

    #[tokio::test]
    async fn cancel_returns_updated_booking_and_notifies() {
        let (service, notifier, event, seats) = setup(2).await;
        let user = service.store().add_user().await;
        let booking = service
            .create_booking(user, event.id, seats[1].id)
            .await
            .unwrap();

        let cancelled = service.cancel_booking(booking.id, user).await.unwrap();
        assert_eq!(cancelled.id, booking.id);
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        let kinds: Vec<NotificationKind> = notifier.received().iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            [
                NotificationKind::BookingConfirmed,
                NotificationKind::BookingCancelled
            ]
        );
        assert_eq!(notifier.received()[1].booking_code, booking.booking_code);
    }

    #[tokio::test]
    async fn cancel_unknown_booking_is_not_found() {
        let (service, _, _, _) = setup(1).await;
        let user = service.store().add_user().await;

        let err = service.cancel_booking(77, user).await.unwrap_err();
        assert_matches!(err, BookingError::BookingNotFound(77));
    }

    #[tokio::test]
    async fn cancel_commits_even_when_event_is_gone() {
        let (service, _, event, seats) = setup(1).await;
        let user = service.store().add_user().await;
        let booking = service
            .create_booking(user, event.id, seats[0].id)
            .await
            .unwrap();

        service.store().forget_event(event.id).await;

        let cancelled = service.cancel_booking(booking.id, user).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn get_booking_round_trips() {
        let (service, _, event, seats) = setup(1).await;
        let user = service.store().add_user().await;
        let booking = service
            .create_booking(user, event.id, seats[0].id)
            .await
            .unwrap();

        assert_eq!(service.get_booking(booking.id).await.unwrap(), booking);
        assert_matches!(
            service.get_booking(booking.id + 1).await,
            Err(BookingError::BookingNotFound(_))
        );
    }

    #[tokio::test]
    async fn list_bookings_filters_by_user() {
        let (service, _, event, seats) = setup(3).await;
        let alice = service.store().add_user().await;
        let bob = service.store().add_user().await;
        service
            .create_booking(alice, event.id, seats[0].id)
            .await
            .unwrap();
        service
            .create_booking(bob, event.id, seats[1].id)
            .await
            .unwrap();

        assert_eq!(service.list_bookings(None).await.unwrap().len(), 2);
        let mine = service.list_bookings(Some(alice)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, alice);
    }

    #[tokio::test]
    async fn invalid_event_input_is_rejected() {
        let (service, _, _, _) = setup(1).await;

        let err = service
            .create_event_with_seats(&new_event(0))
            .await
            .unwrap_err();
        assert_matches!(err, BookingError::InvalidInput(_));
    }

    #[tokio::test]
    async fn seats_of_unknown_event_is_not_found() {
        let (service, _, _, _) = setup(1).await;

        assert_matches!(
            service.event_seats(555, None).await,
            Err(BookingError::EventNotFound(555))
        );
    }
}
