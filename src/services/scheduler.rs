//! Screening scheduling and programme listings.
//!
//! The scheduler owns the single-room model: at most one screening may hold
//! a given date+hour slot, whichever movie it shows. It also applies the
//! temporal eligibility rule for listings, with "now" always taken from the
//! injected clock.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::models::{Movie, NewScreening, RoomLayout, Screening, SeatMap, Slot};
use crate::repository::{Repository, RepositoryError};
use crate::services::locks::ScreeningLocks;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("hour {0} is outside the scheduling day (0-23)")]
    InvalidHour(u8),
    #[error("movie {0} does not exist")]
    UnknownMovie(i64),
    #[error("cannot schedule a screening in the past ({0})")]
    PastSchedulingAttempt(Slot),
    #[error("{movie} is already showing at {slot}")]
    SlotConflict { slot: Slot, movie: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Ordering strategy for programme listings, chosen per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreeningOrder {
    /// Ascending by date, then hour. Ties cannot occur: the slot invariant
    /// admits one screening per date+hour.
    #[default]
    StartTime,
    /// Ascending by movie name, start time as the tie-break.
    Title,
}

/// Optional narrowing of a programme listing.
#[derive(Debug, Clone, Default)]
pub struct ProgrammeFilter {
    /// Case-insensitive substring match on the movie name.
    pub query: Option<String>,
    /// Keep only screenings on this show date.
    pub date: Option<NaiveDate>,
}

/// One programme line: a screening joined with its movie.
#[derive(Debug, Clone)]
pub struct ProgrammeEntry {
    pub screening: Screening,
    pub movie: Movie,
}

#[derive(Clone)]
pub struct ScreeningScheduler {
    repository: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
    locks: Arc<ScreeningLocks>,
    layout: RoomLayout,
}

impl ScreeningScheduler {
    pub fn new(
        repository: Arc<dyn Repository>,
        clock: Arc<dyn Clock>,
        locks: Arc<ScreeningLocks>,
        layout: RoomLayout,
    ) -> Self {
        Self { repository, clock, locks, layout }
    }

    /// Creates a screening with an all-free seat map, provided the slot is
    /// in the future and nothing else occupies it.
    pub async fn schedule(
        &self,
        movie_id: i64,
        date: NaiveDate,
        hour: u8,
    ) -> Result<Screening, ScheduleError> {
        if hour > 23 {
            return Err(ScheduleError::InvalidHour(hour));
        }
        let movie = match self.repository.load_movie(movie_id).await {
            Ok(movie) => movie,
            Err(err) if err.is_not_found() => return Err(ScheduleError::UnknownMovie(movie_id)),
            Err(err) => return Err(err.into()),
        };
        let slot = Slot::new(date, hour);
        if slot.is_past(self.clock.now()) {
            warn!(%slot, movie_id, "rejected scheduling attempt in the past");
            return Err(ScheduleError::PastSchedulingAttempt(slot));
        }
        // The guard makes the conflict check and the insert atomic; without
        // it two schedule calls could both see the slot as free.
        let _slots = self.locks.lock_slots().await;
        if let Some(holder) = self.slot_holder(slot).await? {
            warn!(%slot, movie_id, holder = %holder.name, "rejected schedule, slot taken");
            return Err(ScheduleError::SlotConflict { slot, movie: holder.name });
        }
        let screening = self
            .repository
            .create_screening(NewScreening {
                movie_id,
                slot,
                seat_map: SeatMap::all_free(self.layout),
            })
            .await?;
        info!(screening_id = screening.id, movie = %movie.name, %slot, "scheduled screening");
        Ok(screening)
    }

    /// The movie currently holding `slot`, if any.
    async fn slot_holder(&self, slot: Slot) -> Result<Option<Movie>, RepositoryError> {
        let screenings = self.repository.load_screenings_all().await?;
        match screenings.into_iter().find(|s| s.slot == slot) {
            Some(existing) => Ok(Some(self.repository.load_movie(existing.movie_id).await?)),
            None => Ok(None),
        }
    }

    /// All non-past screenings joined with their movies, filtered and
    /// ordered. Recomputed from the store on every call, so each listing
    /// reflects the latest committed seat state.
    pub async fn list_upcoming(
        &self,
        filter: &ProgrammeFilter,
        order: ScreeningOrder,
    ) -> Result<Vec<ProgrammeEntry>, RepositoryError> {
        let now = self.clock.now();
        let mut entries = self.load_entries().await?;
        entries.retain(|entry| !entry.screening.slot.is_past(now));
        if let Some(query) = filter.query.as_deref() {
            let needle = query.to_lowercase();
            entries.retain(|entry| entry.movie.name.to_lowercase().contains(&needle));
        }
        if let Some(date) = filter.date {
            entries.retain(|entry| entry.screening.slot.date == date);
        }
        sort_entries(&mut entries, order);
        Ok(entries)
    }

    /// Every screening in the store, past ones included, in start-time
    /// order. Feeds full-history reports.
    pub async fn list_all(&self) -> Result<Vec<ProgrammeEntry>, RepositoryError> {
        let mut entries = self.load_entries().await?;
        sort_entries(&mut entries, ScreeningOrder::StartTime);
        Ok(entries)
    }

    async fn load_entries(&self) -> Result<Vec<ProgrammeEntry>, RepositoryError> {
        let screenings = self.repository.load_screenings_all().await?;
        let movies: HashMap<i64, Movie> = self
            .repository
            .load_movies_all()
            .await?
            .into_iter()
            .map(|movie| (movie.id, movie))
            .collect();
        screenings
            .into_iter()
            .map(|screening| {
                let movie = movies.get(&screening.movie_id).cloned().ok_or(
                    RepositoryError::NotFound { entity: "movie", id: screening.movie_id },
                )?;
                Ok(ProgrammeEntry { screening, movie })
            })
            .collect()
    }

    /// Deletes a screening and everything referencing it: bookings first,
    /// then the screening row. Serialized with reserve/cancel on the same
    /// screening so no booking can slip in mid-cascade.
    pub async fn delete(&self, screening_id: i64) -> Result<(), ScheduleError> {
        let guard = self.locks.lock_screening(screening_id).await;
        let bookings = self.repository.load_bookings_by_screening(screening_id).await?;
        let cascaded = bookings.len();
        for booking in bookings {
            self.repository.delete_booking(booking.id).await?;
        }
        self.repository.delete_screening(screening_id).await?;
        drop(guard);
        self.locks.forget(screening_id);
        info!(screening_id, cascaded, "deleted screening and its bookings");
        Ok(())
    }
}

fn sort_entries(entries: &mut [ProgrammeEntry], order: ScreeningOrder) {
    match order {
        ScreeningOrder::StartTime => entries.sort_by_key(|entry| entry.screening.slot),
        ScreeningOrder::Title => entries.sort_by(|a, b| {
            a.movie
                .name
                .cmp(&b.movie.name)
                .then_with(|| a.screening.slot.cmp(&b.screening.slot))
        }),
    }
}
