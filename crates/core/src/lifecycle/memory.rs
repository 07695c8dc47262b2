//! In-memory [`BookingStore`] for tests and local experiments.
//!
//! A transaction takes an owned lock on the whole state and works on a copy
//! that replaces the state on commit, so transactions are serializable and a
//! dropped transaction leaves nothing behind. The same unique constraints as
//! the PostgreSQL schema are enforced on insert.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::booking::{Booking, NewBooking};
use crate::catalog::{Event, NewEvent};
use crate::inventory::{seat_layout, Seat};
use crate::status::{BookingStatus, SeatStatus};
use crate::types::DbId;

use super::port::{
    BookingStore, BookingTx, StoreError, UQ_ACTIVE_SEAT, UQ_ACTIVE_USER_EVENT, UQ_BOOKING_CODE,
};

/// Operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    ReserveSeat,
    InsertBooking,
    /// `insert_booking` reports a `uq_bookings_booking_code` violation.
    BookingCodeCollision,
    DecrementAvailable,
    CancelBooking,
    ReleaseSeat,
    IncrementAvailable,
    Commit,
    /// Seat generation inside `create_event_with_seats`.
    GenerateSeats,
}

type FailPoints = Arc<StdMutex<HashMap<FailPoint, usize>>>;

/// Consume one pending failure for `point`, if any.
fn trip(failpoints: &FailPoints, point: FailPoint) -> bool {
    let mut pending = failpoints
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    match pending.get_mut(&point) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    }
}

fn injected(failpoints: &FailPoints, point: FailPoint) -> Result<(), StoreError> {
    if trip(failpoints, point) {
        return Err(StoreError::Backend(format!("injected failure at {point:?}")));
    }
    Ok(())
}

#[derive(Debug, Default, Clone)]
struct Sequences {
    user: DbId,
    event: DbId,
    seat: DbId,
    booking: DbId,
}

fn next(counter: &mut DbId) -> DbId {
    *counter += 1;
    *counter
}

#[derive(Debug, Default, Clone)]
struct MemoryState {
    users: BTreeSet<DbId>,
    events: BTreeMap<DbId, Event>,
    seats: BTreeMap<DbId, Seat>,
    bookings: BTreeMap<DbId, Booking>,
    ids: Sequences,
}

impl MemoryState {
    fn unique_violation(&self, input: &NewBooking) -> Option<&'static str> {
        for booking in self.bookings.values() {
            if booking.booking_code == input.booking_code {
                return Some(UQ_BOOKING_CODE);
            }
            if !booking.is_active() {
                continue;
            }
            if booking.seat_id == input.seat_id {
                return Some(UQ_ACTIVE_SEAT);
            }
            if booking.user_id == input.user_id && booking.event_id == input.event_id {
                return Some(UQ_ACTIVE_USER_EVENT);
            }
        }
        None
    }
}

/// Shared in-memory store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    failpoints: FailPoints,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user and return its id.
    pub async fn add_user(&self) -> DbId {
        let mut state = self.state.lock().await;
        let id = next(&mut state.ids.user);
        state.users.insert(id);
        id
    }

    /// Make the next `times` calls of `point` fail.
    pub fn fail_times(&self, point: FailPoint, times: usize) {
        let mut pending = self
            .failpoints
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *pending.entry(point).or_insert(0) += times;
    }

    pub fn fail_once(&self, point: FailPoint) {
        self.fail_times(point, 1);
    }

    /// Drop an event row while leaving its seats and bookings in place.
    ///
    /// Simulates a dangling reference so cancellation can be exercised
    /// against a missing event.
    pub async fn forget_event(&self, event_id: DbId) {
        self.state.lock().await.events.remove(&event_id);
    }

    /// Describe every broken data invariant. Empty when the state is sound.
    ///
    /// Checks that each event's `available_seats` equals its count of
    /// available seats and stays within `0..=total_seats`, that no seat is
    /// held by two confirmed bookings, and that no user holds two confirmed
    /// bookings for one event.
    pub async fn invariant_violations(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut violations = Vec::new();

        for event in state.events.values() {
            let available = state
                .seats
                .values()
                .filter(|s| s.event_id == event.id && s.is_available())
                .count();
            if usize::try_from(event.available_seats).ok() != Some(available) {
                violations.push(format!(
                    "event {} counter {} != {} available seats",
                    event.id, event.available_seats, available
                ));
            }
            if event.available_seats < 0 || event.available_seats > event.total_seats {
                violations.push(format!(
                    "event {} counter {} outside 0..={}",
                    event.id, event.available_seats, event.total_seats
                ));
            }
        }

        let mut holders: HashMap<DbId, usize> = HashMap::new();
        let mut per_user_event: HashMap<(DbId, DbId), usize> = HashMap::new();
        for booking in state.bookings.values().filter(|b| b.is_active()) {
            *holders.entry(booking.seat_id).or_default() += 1;
            *per_user_event
                .entry((booking.user_id, booking.event_id))
                .or_default() += 1;

            let seat_booked = state
                .seats
                .get(&booking.seat_id)
                .is_some_and(|s| s.status == SeatStatus::Booked);
            if !seat_booked {
                violations.push(format!(
                    "booking {} is confirmed but seat {} is not booked",
                    booking.id, booking.seat_id
                ));
            }
        }
        for (seat_id, count) in holders.into_iter().filter(|(_, c)| *c > 1) {
            violations.push(format!("seat {seat_id} held by {count} confirmed bookings"));
        }
        for ((user_id, event_id), count) in per_user_event.into_iter().filter(|(_, c)| *c > 1) {
            violations.push(format!(
                "user {user_id} holds {count} confirmed bookings for event {event_id}"
            ));
        }

        violations
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx {
            guard,
            working,
            failpoints: Arc::clone(&self.failpoints),
        })
    }

    async fn find_event(&self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        Ok(self.state.lock().await.events.get(&event_id).cloned())
    }

    async fn find_booking(&self, booking_id: DbId) -> Result<Option<Booking>, StoreError> {
        Ok(self.state.lock().await.bookings.get(&booking_id).cloned())
    }

    async fn list_bookings(&self, user_id: Option<DbId>) -> Result<Vec<Booking>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .values()
            .rev()
            .filter(|b| user_id.is_none_or(|uid| b.user_id == uid))
            .cloned()
            .collect())
    }

    async fn list_seats(
        &self,
        event_id: DbId,
        status: Option<SeatStatus>,
    ) -> Result<Vec<Seat>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .seats
            .values()
            .filter(|s| s.event_id == event_id)
            .filter(|s| status.is_none_or(|st| s.status == st))
            .cloned()
            .collect())
    }

    async fn create_event_with_seats(&self, input: &NewEvent) -> Result<Event, StoreError> {
        let mut state = self.state.lock().await;
        let mut working = state.clone();
        let now = Utc::now();

        let event = Event {
            id: next(&mut working.ids.event),
            title: input.title.clone(),
            description: input.description.clone(),
            image_url: input.image_url.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            venue_id: input.venue_id,
            total_seats: input.total_seats,
            available_seats: input.total_seats,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        working.events.insert(event.id, event.clone());

        injected(&self.failpoints, FailPoint::GenerateSeats)?;

        for label in seat_layout(input.total_seats) {
            let seat = Seat {
                id: next(&mut working.ids.seat),
                event_id: event.id,
                section: label.section,
                row: label.row,
                number: label.number,
                status: SeatStatus::Available,
                created_at: now,
                updated_at: now,
            };
            working.seats.insert(seat.id, seat);
        }

        *state = working;
        Ok(event)
    }
}

/// Transaction over [`InMemoryStore`]. Holds the store lock until dropped.
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    failpoints: FailPoints,
}

#[async_trait]
impl BookingTx for MemoryTx {
    async fn find_event(&mut self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        Ok(self.working.events.get(&event_id).cloned())
    }

    async fn user_exists(&mut self, user_id: DbId) -> Result<bool, StoreError> {
        Ok(self.working.users.contains(&user_id))
    }

    async fn find_active_booking(
        &mut self,
        user_id: DbId,
        event_id: DbId,
    ) -> Result<Option<Booking>, StoreError> {
        Ok(self
            .working
            .bookings
            .values()
            .find(|b| b.is_active() && b.user_id == user_id && b.event_id == event_id)
            .cloned())
    }

    async fn reserve_seat(
        &mut self,
        event_id: DbId,
        seat_id: DbId,
    ) -> Result<Option<Seat>, StoreError> {
        injected(&self.failpoints, FailPoint::ReserveSeat)?;
        let seat = self
            .working
            .seats
            .get_mut(&seat_id)
            .filter(|s| s.event_id == event_id && s.is_available());
        Ok(seat.map(|seat| {
            seat.status = SeatStatus::Booked;
            seat.updated_at = Utc::now();
            seat.clone()
        }))
    }

    async fn release_seat(&mut self, seat_id: DbId) -> Result<(), StoreError> {
        injected(&self.failpoints, FailPoint::ReleaseSeat)?;
        if let Some(seat) = self.working.seats.get_mut(&seat_id) {
            seat.status = SeatStatus::Available;
            seat.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_booking(&mut self, input: &NewBooking) -> Result<Booking, StoreError> {
        injected(&self.failpoints, FailPoint::InsertBooking)?;
        if trip(&self.failpoints, FailPoint::BookingCodeCollision) {
            return Err(StoreError::UniqueViolation(UQ_BOOKING_CODE.to_string()));
        }
        if let Some(constraint) = self.working.unique_violation(input) {
            return Err(StoreError::UniqueViolation(constraint.to_string()));
        }

        let now = Utc::now();
        let booking = Booking {
            id: next(&mut self.working.ids.booking),
            user_id: input.user_id,
            event_id: input.event_id,
            seat_id: input.seat_id,
            booking_code: input.booking_code.clone(),
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };
        self.working.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn lock_booking(&mut self, booking_id: DbId) -> Result<Option<Booking>, StoreError> {
        Ok(self.working.bookings.get(&booking_id).cloned())
    }

    async fn cancel_booking(&mut self, booking_id: DbId) -> Result<Option<Booking>, StoreError> {
        injected(&self.failpoints, FailPoint::CancelBooking)?;
        let booking = self
            .working
            .bookings
            .get_mut(&booking_id)
            .filter(|b| b.is_active());
        Ok(booking.map(|booking| {
            booking.status = BookingStatus::Cancelled;
            booking.updated_at = Utc::now();
            booking.clone()
        }))
    }

    async fn decrement_available(&mut self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        injected(&self.failpoints, FailPoint::DecrementAvailable)?;
        let event = self
            .working
            .events
            .get_mut(&event_id)
            .filter(|e| e.available_seats > 0);
        Ok(event.map(|event| {
            event.available_seats -= 1;
            event.updated_at = Utc::now();
            event.clone()
        }))
    }

    async fn increment_available(&mut self, event_id: DbId) -> Result<Option<Event>, StoreError> {
        injected(&self.failpoints, FailPoint::IncrementAvailable)?;
        let event = self
            .working
            .events
            .get_mut(&event_id)
            .filter(|e| e.available_seats < e.total_seats);
        Ok(event.map(|event| {
            event.available_seats += 1;
            event.updated_at = Utc::now();
            event.clone()
        }))
    }

    async fn commit(self) -> Result<(), StoreError> {
        injected(&self.failpoints, FailPoint::Commit)?;
        let MemoryTx {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }
}
