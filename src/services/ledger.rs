//! Seat reservation and release.
//!
//! All seat mutation funnels through here, under the owning screening's
//! lock: load, validate, mark, persist, then write the booking. A working
//! copy of the seat map backs every mutation, so a rejected request leaves
//! the store exactly as it was found.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::models::{Booking, NewBooking, Screening, Seat, SeatMap, Slot};
use crate::models::seat_map::SeatMapError;
use crate::repository::{Repository, RepositoryError};
use crate::services::locks::ScreeningLocks;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no seats selected")]
    NoSeatsSelected,
    #[error("seat {0} is outside the room layout")]
    UnknownSeat(Seat),
    #[error("seat {0} is already booked")]
    SeatUnavailable(Seat),
    #[error("the screening at {0} has already started")]
    PastScreening(Slot),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Clone)]
pub struct BookingLedger {
    repository: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
    locks: Arc<ScreeningLocks>,
}

impl BookingLedger {
    pub fn new(
        repository: Arc<dyn Repository>,
        clock: Arc<dyn Clock>,
        locks: Arc<ScreeningLocks>,
    ) -> Self {
        Self { repository, clock, locks }
    }

    /// Books `selection` for `username` on the given screening. Duplicate
    /// seats in the selection collapse to one. Fails without touching the
    /// store if the screening has started, any seat is unknown to the
    /// layout, or any seat is already taken.
    pub async fn reserve(
        &self,
        screening_id: i64,
        username: &str,
        selection: &[Seat],
    ) -> Result<Booking, LedgerError> {
        if selection.is_empty() {
            return Err(LedgerError::NoSeatsSelected);
        }
        let _guard = self.locks.lock_screening(screening_id).await;
        let mut screening = self.repository.load_screening(screening_id).await?;
        if screening.slot.is_past(self.clock.now()) {
            return Err(LedgerError::PastScreening(screening.slot));
        }

        // Validate the whole selection before marking anything.
        let mut picked: Vec<Seat> = Vec::with_capacity(selection.len());
        for seat in selection {
            if picked.contains(seat) {
                continue;
            }
            let current = screening
                .seat_map
                .seat_at(seat.row, seat.number)
                .ok_or(LedgerError::UnknownSeat(*seat))?;
            if current.booked {
                warn!(
                    screening_id,
                    seat = %current,
                    username,
                    "reservation lost the seat to an earlier booking"
                );
                return Err(LedgerError::SeatUnavailable(current));
            }
            picked.push(current);
        }

        let undo = screening.seat_map.clone();
        for seat in &picked {
            mark(&mut screening.seat_map, seat, true)?;
        }
        self.repository.save_screening(&screening).await?;

        let new_booking = NewBooking {
            screening_id,
            username: username.to_string(),
            seats: picked.iter().map(|seat| Seat::new(seat.row, seat.number, true)).collect(),
        };
        match self.repository.create_booking(new_booking).await {
            Ok(booking) => {
                info!(
                    booking_id = booking.id,
                    screening_id,
                    username,
                    seats = %booking.seat_summary(),
                    "reserved seats"
                );
                Ok(booking)
            }
            Err(err) => {
                self.compensate(screening, undo, &err).await;
                Err(err.into())
            }
        }
    }

    /// Releases a booking's seats and deletes it. Rejected once the
    /// screening has started, leaving everything in place.
    pub async fn cancel(&self, booking_id: i64) -> Result<(), LedgerError> {
        // The first load only resolves which screening to lock; the booking
        // is re-read under the lock in case it was cancelled concurrently.
        let screening_id = self.repository.load_booking(booking_id).await?.screening_id;
        let _guard = self.locks.lock_screening(screening_id).await;
        let booking = self.repository.load_booking(booking_id).await?;
        let mut screening = self.repository.load_screening(booking.screening_id).await?;
        if screening.slot.is_past(self.clock.now()) {
            return Err(LedgerError::PastScreening(screening.slot));
        }

        let undo = screening.seat_map.clone();
        for seat in &booking.seats {
            mark(&mut screening.seat_map, seat, false)?;
        }
        self.repository.save_screening(&screening).await?;

        if let Err(err) = self.repository.delete_booking(booking.id).await {
            self.compensate(screening, undo, &err).await;
            return Err(err.into());
        }
        info!(
            booking_id = booking.id,
            screening_id = booking.screening_id,
            username = %booking.username,
            seats = %booking.seat_summary(),
            "cancelled booking"
        );
        Ok(())
    }

    /// Restores the seat map persisted before a failed booking write, so
    /// the store never keeps seats whose booking does not exist.
    async fn compensate(&self, mut screening: Screening, undo: SeatMap, cause: &RepositoryError) {
        error!(
            screening_id = screening.id,
            error = %cause,
            "booking write failed, restoring the previous seat map"
        );
        screening.seat_map = undo;
        if let Err(err) = self.repository.save_screening(&screening).await {
            error!(
                screening_id = screening.id,
                error = %err,
                "seat map restore failed, stored seats and bookings now disagree"
            );
        }
    }
}

// Picked seats come from the map itself and booking seats were written
// through it, so a miss here means the stored pair is inconsistent.
fn mark(map: &mut SeatMap, seat: &Seat, booked: bool) -> Result<(), LedgerError> {
    map.set_booked(seat, booked)
        .map_err(|err: SeatMapError| LedgerError::Repository(RepositoryError::InvalidSeatMap(err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{NewMovie, NewScreening, RoomLayout};
    use crate::repository::memory::InMemoryRepository;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> Slot {
        Slot::new(date(2025, 6, 1), 18)
    }

    fn seat(row: char, number: u32) -> Seat {
        Seat::new(row, number, false)
    }

    fn ledger_over(repository: Arc<dyn Repository>) -> BookingLedger {
        BookingLedger::new(
            repository,
            Arc::new(FixedClock(now())),
            Arc::new(ScreeningLocks::new()),
        )
    }

    async fn seed_screening(repository: &InMemoryRepository, slot: Slot) -> i64 {
        let movie = repository
            .create_movie(NewMovie {
                name: "Arrival".to_string(),
                genre: "Drama".to_string(),
                year: 2016,
                director: "D. Villeneuve".to_string(),
                description: "A film.".to_string(),
            })
            .await
            .unwrap();
        repository
            .create_screening(NewScreening {
                movie_id: movie.id,
                slot,
                seat_map: SeatMap::all_free(RoomLayout::DEFAULT),
            })
            .await
            .unwrap()
            .id
    }

    async fn setup() -> (BookingLedger, Arc<InMemoryRepository>, i64) {
        let repository = Arc::new(InMemoryRepository::new(RoomLayout::DEFAULT));
        let screening_id = seed_screening(&repository, Slot::new(date(2025, 6, 2), 20)).await;
        (ledger_over(repository.clone()), repository, screening_id)
    }

    #[tokio::test]
    async fn reserve_books_exactly_the_selection() {
        let (ledger, repository, screening_id) = setup().await;

        let booking = ledger
            .reserve(screening_id, "ada", &[seat('A', 8), seat('D', 10)])
            .await
            .unwrap();

        assert_eq!(booking.screening_id, screening_id);
        assert_eq!(booking.username, "ada");
        assert_eq!(booking.seat_summary(), "A8, D10");
        let stored = repository.load_screening(screening_id).await.unwrap();
        assert_eq!(stored.available_seats(), 48);
        assert!(stored.seat_map.seat_at('A', 8).unwrap().booked);
        assert!(stored.seat_map.seat_at('D', 10).unwrap().booked);
    }

    #[tokio::test]
    async fn reserve_rejects_an_empty_selection() {
        let (ledger, _, screening_id) = setup().await;
        let err = ledger.reserve(screening_id, "ada", &[]).await.unwrap_err();
        assert!(matches!(err, LedgerError::NoSeatsSelected));
    }

    #[tokio::test]
    async fn duplicate_seats_collapse_to_one() {
        let (ledger, repository, screening_id) = setup().await;

        let booking = ledger
            .reserve(screening_id, "ada", &[seat('A', 1), seat('A', 1)])
            .await
            .unwrap();

        assert_eq!(booking.seats.len(), 1);
        let stored = repository.load_screening(screening_id).await.unwrap();
        assert_eq!(stored.available_seats(), 49);
    }

    #[tokio::test]
    async fn a_failed_reserve_changes_nothing() {
        let (ledger, repository, screening_id) = setup().await;
        ledger.reserve(screening_id, "ada", &[seat('A', 1)]).await.unwrap();
        let before_map = repository.load_screening(screening_id).await.unwrap().seat_map.encode();
        let before_bookings = repository.load_bookings_by_screening(screening_id).await.unwrap();

        // B1 is free, A1 is not; the whole request must fail.
        let err = ledger
            .reserve(screening_id, "grace", &[seat('B', 1), seat('A', 1)])
            .await
            .unwrap_err();

        match err {
            LedgerError::SeatUnavailable(taken) => assert_eq!(taken, seat('A', 1)),
            other => panic!("expected SeatUnavailable, got {other:?}"),
        }
        let after = repository.load_screening(screening_id).await.unwrap();
        assert_eq!(after.seat_map.encode(), before_map);
        let after_bookings = repository.load_bookings_by_screening(screening_id).await.unwrap();
        assert_eq!(after_bookings.len(), before_bookings.len());
    }

    #[tokio::test]
    async fn seats_outside_the_layout_are_rejected() {
        let (ledger, repository, screening_id) = setup().await;
        let before = repository.load_screening(screening_id).await.unwrap().seat_map.encode();

        for ghost in [seat('A', 11), seat('F', 1)] {
            let err = ledger.reserve(screening_id, "ada", &[ghost]).await.unwrap_err();
            match err {
                LedgerError::UnknownSeat(unknown) => assert_eq!(unknown, ghost),
                other => panic!("expected UnknownSeat, got {other:?}"),
            }
        }
        let after = repository.load_screening(screening_id).await.unwrap().seat_map.encode();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn reserve_rejects_started_screenings() {
        let repository = Arc::new(InMemoryRepository::new(RoomLayout::DEFAULT));
        // Now is 2025-06-01 18:00, so an 18:00 screening has started.
        let screening_id = seed_screening(&repository, now()).await;
        let ledger = ledger_over(repository.clone());

        let err = ledger.reserve(screening_id, "ada", &[seat('A', 1)]).await.unwrap_err();
        assert!(matches!(err, LedgerError::PastScreening(_)));
        let stored = repository.load_screening(screening_id).await.unwrap();
        assert_eq!(stored.available_seats(), 50);
    }

    #[tokio::test]
    async fn cancel_restores_what_reserve_took() {
        let (ledger, repository, screening_id) = setup().await;
        let before = repository.load_screening(screening_id).await.unwrap().seat_map.encode();

        let booking = ledger
            .reserve(screening_id, "ada", &[seat('C', 3), seat('C', 4)])
            .await
            .unwrap();
        ledger.cancel(booking.id).await.unwrap();

        let after = repository.load_screening(screening_id).await.unwrap();
        assert_eq!(after.seat_map.encode(), before);
        assert_eq!(after.available_seats(), 50);
        assert!(repository.load_booking(booking.id).await.is_err());
    }

    #[tokio::test]
    async fn cancel_rejects_started_screenings() {
        let repository = Arc::new(InMemoryRepository::new(RoomLayout::DEFAULT));
        let screening_id = seed_screening(&repository, Slot::new(date(2025, 5, 30), 20)).await;
        // Seed the booked state directly; the screening is already past.
        let mut screening = repository.load_screening(screening_id).await.unwrap();
        screening.seat_map.set_booked(&seat('A', 1), true).unwrap();
        repository.save_screening(&screening).await.unwrap();
        let booking = repository
            .create_booking(NewBooking {
                screening_id,
                username: "ada".to_string(),
                seats: vec![Seat::new('A', 1, true)],
            })
            .await
            .unwrap();
        let ledger = ledger_over(repository.clone());

        let err = ledger.cancel(booking.id).await.unwrap_err();

        assert!(matches!(err, LedgerError::PastScreening(_)));
        assert!(repository.load_booking(booking.id).await.is_ok());
        let stored = repository.load_screening(screening_id).await.unwrap();
        assert!(stored.seat_map.seat_at('A', 1).unwrap().booked);
    }

    #[tokio::test]
    async fn cancelling_an_unknown_booking_reports_not_found() {
        let (ledger, _, _) = setup().await;
        match ledger.cancel(404).await.unwrap_err() {
            LedgerError::Repository(err) => assert!(err.is_not_found()),
            other => panic!("expected repository not-found, got {other:?}"),
        }
    }

    /// Wraps the in-memory store and fails selected operations, to pin the
    /// compensating-rollback behavior.
    struct FailingRepository {
        inner: InMemoryRepository,
        fail_create_booking: AtomicBool,
        fail_delete_booking: AtomicBool,
    }

    impl FailingRepository {
        fn new(inner: InMemoryRepository) -> Self {
            Self {
                inner,
                fail_create_booking: AtomicBool::new(false),
                fail_delete_booking: AtomicBool::new(false),
            }
        }

        fn outage() -> RepositoryError {
            RepositoryError::Database(sqlx::Error::PoolClosed)
        }
    }

    #[async_trait]
    impl Repository for FailingRepository {
        async fn load_screening(&self, id: i64) -> Result<Screening, RepositoryError> {
            self.inner.load_screening(id).await
        }
        async fn create_screening(
            &self,
            new: NewScreening,
        ) -> Result<Screening, RepositoryError> {
            self.inner.create_screening(new).await
        }
        async fn save_screening(&self, screening: &Screening) -> Result<(), RepositoryError> {
            self.inner.save_screening(screening).await
        }
        async fn delete_screening(&self, id: i64) -> Result<(), RepositoryError> {
            self.inner.delete_screening(id).await
        }
        async fn load_screenings_all(&self) -> Result<Vec<Screening>, RepositoryError> {
            self.inner.load_screenings_all().await
        }
        async fn load_booking(&self, id: i64) -> Result<Booking, RepositoryError> {
            self.inner.load_booking(id).await
        }
        async fn create_booking(&self, new: NewBooking) -> Result<Booking, RepositoryError> {
            if self.fail_create_booking.load(Ordering::SeqCst) {
                return Err(Self::outage());
            }
            self.inner.create_booking(new).await
        }
        async fn delete_booking(&self, id: i64) -> Result<(), RepositoryError> {
            if self.fail_delete_booking.load(Ordering::SeqCst) {
                return Err(Self::outage());
            }
            self.inner.delete_booking(id).await
        }
        async fn load_bookings_by_screening(
            &self,
            screening_id: i64,
        ) -> Result<Vec<Booking>, RepositoryError> {
            self.inner.load_bookings_by_screening(screening_id).await
        }
        async fn load_bookings_by_user(
            &self,
            username: &str,
        ) -> Result<Vec<Booking>, RepositoryError> {
            self.inner.load_bookings_by_user(username).await
        }
        async fn load_movie(&self, id: i64) -> Result<crate::models::Movie, RepositoryError> {
            self.inner.load_movie(id).await
        }
        async fn load_movies_all(&self) -> Result<Vec<crate::models::Movie>, RepositoryError> {
            self.inner.load_movies_all().await
        }
        async fn create_movie(
            &self,
            new: NewMovie,
        ) -> Result<crate::models::Movie, RepositoryError> {
            self.inner.create_movie(new).await
        }
        async fn delete_movie(&self, id: i64) -> Result<(), RepositoryError> {
            self.inner.delete_movie(id).await
        }
    }

    #[tokio::test]
    async fn a_failed_booking_write_rolls_the_seat_map_back() {
        let inner = InMemoryRepository::new(RoomLayout::DEFAULT);
        let screening_id = seed_screening(&inner, Slot::new(date(2025, 6, 2), 20)).await;
        let failing = Arc::new(FailingRepository::new(inner));
        let ledger = ledger_over(failing.clone());
        failing.fail_create_booking.store(true, Ordering::SeqCst);

        let err = ledger.reserve(screening_id, "ada", &[seat('A', 1)]).await.unwrap_err();

        assert!(matches!(err, LedgerError::Repository(_)));
        let stored = failing.load_screening(screening_id).await.unwrap();
        assert_eq!(stored.available_seats(), 50, "seat map must be restored");
        assert!(failing
            .load_bookings_by_screening(screening_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn a_failed_booking_delete_keeps_the_seats_booked() {
        let inner = InMemoryRepository::new(RoomLayout::DEFAULT);
        let screening_id = seed_screening(&inner, Slot::new(date(2025, 6, 2), 20)).await;
        let failing = Arc::new(FailingRepository::new(inner));
        let ledger = ledger_over(failing.clone());
        let booking = ledger.reserve(screening_id, "ada", &[seat('A', 1)]).await.unwrap();
        failing.fail_delete_booking.store(true, Ordering::SeqCst);

        let err = ledger.cancel(booking.id).await.unwrap_err();

        assert!(matches!(err, LedgerError::Repository(_)));
        // The booking still exists, so its seat must still read booked.
        let stored = failing.load_screening(screening_id).await.unwrap();
        assert!(stored.seat_map.seat_at('A', 1).unwrap().booked);
        assert!(failing.load_booking(booking.id).await.is_ok());
    }
}
