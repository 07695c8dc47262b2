//! Booking lifecycle against PostgreSQL through `PgBookingStore`.
//!
//! Exercises the conditional updates, partial unique indexes and transaction
//! rollback that keep seats, counters and bookings consistent.

use std::sync::Arc;

use assert_matches::assert_matches;
use boxoffice_core::catalog::{Event, NewEvent};
use boxoffice_core::inventory::Seat;
use boxoffice_core::lifecycle::{
    BookingError, BookingService, BookingStore, ErrorKind, NoopNotifier, StoreError,
};
use boxoffice_core::status::{BookingStatus, SeatStatus};
use boxoffice_core::types::DbId;
use boxoffice_db::models::user::CreateUser;
use boxoffice_db::repositories::{BookingRepo, EventRepo, SeatRepo, UserRepo};
use boxoffice_db::store::PgBookingStore;
use chrono::{Duration, Utc};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn service(pool: &PgPool) -> BookingService<PgBookingStore> {
    BookingService::new(
        Arc::new(PgBookingStore::new(pool.clone())),
        Arc::new(NoopNotifier),
    )
}

async fn user(pool: &PgPool, email: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            name: email.to_string(),
            role: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn event(service: &BookingService<PgBookingStore>, total_seats: i32) -> (Event, Vec<Seat>) {
    let start = Utc::now() + Duration::days(14);
    let event = service
        .create_event_with_seats(&NewEvent {
            title: "Midnight Cinema".to_string(),
            description: None,
            image_url: None,
            start_date: start,
            end_date: start + Duration::hours(2),
            venue_id: None,
            total_seats,
            status: None,
        })
        .await
        .unwrap();
    let seats = service.event_seats(event.id, None).await.unwrap();
    (event, seats)
}

async fn available(pool: &PgPool, event_id: DbId) -> i32 {
    EventRepo::find_by_id(pool, event_id)
        .await
        .unwrap()
        .unwrap()
        .available_seats
}

/// The counter matches the number of available seats.
async fn assert_counter_consistent(pool: &PgPool, event_id: DbId) {
    let seats = SeatRepo::list_by_event(pool, event_id, Some(SeatStatus::Available))
        .await
        .unwrap();
    assert_eq!(available(pool, event_id).await as usize, seats.len());
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_single_seat_scenario(pool: PgPool) {
    let service = service(&pool);
    let alice = user(&pool, "alice@example.com").await;
    let bob = user(&pool, "bob@example.com").await;
    let (event, seats) = event(&service, 1).await;
    let seat = seats[0].id;

    let booking = service.create_booking(alice, event.id, seat).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(available(&pool, event.id).await, 0);

    let err = service.create_booking(bob, event.id, seat).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "Seat is not available");

    service.cancel_booking(booking.id, alice).await.unwrap();
    assert_eq!(available(&pool, event.id).await, 1);

    service.create_booking(bob, event.id, seat).await.unwrap();
    assert_eq!(available(&pool, event.id).await, 0);
    assert_counter_consistent(&pool, event.id).await;
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_creates_on_one_seat(pool: PgPool) {
    const CONTENDERS: usize = 8;

    let service = service(&pool);
    let (event, seats) = event(&service, 2).await;
    let mut users = Vec::new();
    for i in 0..CONTENDERS {
        users.push(user(&pool, &format!("fan{i}@example.com")).await);
    }

    let attempts = users.into_iter().map(|user_id| {
        let service = service.clone();
        let (event_id, seat_id) = (event.id, seats[0].id);
        tokio::spawn(async move { service.create_booking(user_id, event_id, seat_id).await })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_matches!(err, BookingError::SeatUnavailable { .. });
    }
    assert_eq!(available(&pool, event.id).await, 1);
    assert_counter_consistent(&pool, event.id).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_creates_by_one_user(pool: PgPool) {
    let service = service(&pool);
    let (event, seats) = event(&service, 4).await;
    let user_id = user(&pool, "eager@example.com").await;

    let attempts = seats.iter().map(|seat| {
        let service = service.clone();
        let (event_id, seat_id) = (event.id, seat.id);
        tokio::spawn(async move { service.create_booking(user_id, event_id, seat_id).await })
    });
    let results = futures::future::join_all(attempts).await;

    let successes = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
    assert_eq!(successes, 1);
    for result in &results {
        if let Ok(Err(err)) = result {
            assert_matches!(err, BookingError::DuplicateActiveBooking { .. });
        }
    }
    assert_eq!(available(&pool, event.id).await, 3);
    assert_counter_consistent(&pool, event.id).await;
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cancel_rules(pool: PgPool) {
    let service = service(&pool);
    let owner = user(&pool, "owner@example.com").await;
    let stranger = user(&pool, "stranger@example.com").await;
    let (event, seats) = event(&service, 2).await;
    let booking = service
        .create_booking(owner, event.id, seats[1].id)
        .await
        .unwrap();

    let err = service.cancel_booking(booking.id, stranger).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(available(&pool, event.id).await, 1);

    let cancelled = service.cancel_booking(booking.id, owner).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let err = service.cancel_booking(booking.id, owner).await.unwrap_err();
    assert_matches!(err, BookingError::AlreadyCancelled { .. });
    assert_eq!(available(&pool, event.id).await, 2);

    assert_matches!(
        service.cancel_booking(booking.id + 1_000, owner).await,
        Err(BookingError::BookingNotFound(_))
    );
    assert_counter_consistent(&pool, event.id).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_user_and_event(pool: PgPool) {
    let service = service(&pool);
    let (event, seats) = event(&service, 1).await;
    let known = user(&pool, "known@example.com").await;

    assert_matches!(
        service.create_booking(known + 500, event.id, seats[0].id).await,
        Err(BookingError::UserNotFound(_))
    );
    assert_matches!(
        service.create_booking(known, event.id + 500, seats[0].id).await,
        Err(BookingError::EventNotFound(_))
    );
    assert_eq!(available(&pool, event.id).await, 1);
}

// ---------------------------------------------------------------------------
// Storage port
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dropped_transaction_rolls_back(pool: PgPool) {
    let store = PgBookingStore::new(pool.clone());
    let service = service(&pool);
    let (event, seats) = event(&service, 1).await;

    {
        use boxoffice_core::lifecycle::BookingTx;
        let mut tx = store.begin().await.unwrap();
        assert!(tx.reserve_seat(event.id, seats[0].id).await.unwrap().is_some());
        assert!(tx.decrement_available(event.id).await.unwrap().is_some());
    }

    assert_eq!(available(&pool, event.id).await, 1);
    assert_counter_consistent(&pool, event.id).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unique_violations_carry_constraint_names(pool: PgPool) {
    use boxoffice_core::booking::NewBooking;
    use boxoffice_core::lifecycle::BookingTx;

    let store = PgBookingStore::new(pool.clone());
    let service = service(&pool);
    let (event, seats) = event(&service, 2).await;
    let alice = user(&pool, "a@example.com").await;
    let bob = user(&pool, "b@example.com").await;
    service
        .create_booking(alice, event.id, seats[0].id)
        .await
        .unwrap();
    let existing = BookingRepo::list(&pool, Some(alice)).await.unwrap().remove(0);

    let cases = [
        (bob, seats[1].id, existing.booking_code.clone(), "uq_bookings_booking_code"),
        (bob, seats[0].id, "BK-000000000001".to_string(), "uq_bookings_active_seat"),
        (alice, seats[1].id, "BK-000000000002".to_string(), "uq_bookings_active_user_event"),
    ];
    for (user_id, seat_id, booking_code, constraint) in cases {
        let mut tx = store.begin().await.unwrap();
        let err = tx
            .insert_booking(&NewBooking {
                user_id,
                event_id: event.id,
                seat_id,
                booking_code,
            })
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::UniqueViolation(constraint.to_string()));
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_counter_check_constraint(pool: PgPool) {
    let service = service(&pool);
    let (event, _) = event(&service, 1).await;

    let result = sqlx::query("UPDATE events SET available_seats = -1 WHERE id = $1")
        .bind(event.id)
        .execute(&pool)
        .await;
    assert!(result.is_err());

    let result = sqlx::query("UPDATE events SET available_seats = total_seats + 1 WHERE id = $1")
        .bind(event.id)
        .execute(&pool)
        .await;
    assert!(result.is_err());
}
