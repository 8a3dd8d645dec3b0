//! In-memory repository for tests and database-free runs.
//!
//! Tables hold the same encoded forms the SQL schema does (seat bitstrings,
//! comma-joined seat labels), so every load goes through the codecs exactly
//! as it would against Postgres. Id assignment mirrors BIGSERIAL: starting
//! at 1, never reused.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::models::booking::{decode_seat_list, encode_seat_list};
use crate::models::{
    Booking, Movie, NewBooking, NewMovie, NewScreening, RoomLayout, Screening, SeatMap, Slot,
};

use super::{Repository, RepositoryError};

struct MovieRow {
    name: String,
    genre: String,
    year: i32,
    director: String,
    description: String,
}

struct ScreeningRow {
    movie_id: i64,
    show_date: NaiveDate,
    show_hour: u8,
    seats: String,
}

struct BookingRow {
    screening_id: i64,
    username: String,
    seats: String,
}

#[derive(Default)]
struct Tables {
    movies: BTreeMap<i64, MovieRow>,
    screenings: BTreeMap<i64, ScreeningRow>,
    bookings: BTreeMap<i64, BookingRow>,
    last_movie_id: i64,
    last_screening_id: i64,
    last_booking_id: i64,
}

pub struct InMemoryRepository {
    layout: RoomLayout,
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new(layout: RoomLayout) -> Self {
        Self { layout, tables: RwLock::new(Tables::default()) }
    }

    fn screening_from_row(&self, id: i64, row: &ScreeningRow) -> Result<Screening, RepositoryError> {
        Ok(Screening {
            id,
            movie_id: row.movie_id,
            slot: Slot::new(row.show_date, row.show_hour),
            seat_map: SeatMap::decode(self.layout, &row.seats)?,
        })
    }
}

fn booking_from_row(id: i64, row: &BookingRow) -> Result<Booking, RepositoryError> {
    Ok(Booking {
        id,
        screening_id: row.screening_id,
        username: row.username.clone(),
        seats: decode_seat_list(&row.seats)?,
    })
}

fn movie_from_row(id: i64, row: &MovieRow) -> Movie {
    Movie {
        id,
        name: row.name.clone(),
        genre: row.genre.clone(),
        year: row.year,
        director: row.director.clone(),
        description: row.description.clone(),
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn load_screening(&self, id: i64) -> Result<Screening, RepositoryError> {
        let tables = self.tables.read().await;
        let row = tables
            .screenings
            .get(&id)
            .ok_or(RepositoryError::NotFound { entity: "screening", id })?;
        self.screening_from_row(id, row)
    }

    async fn create_screening(&self, new: NewScreening) -> Result<Screening, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.last_screening_id += 1;
        let id = tables.last_screening_id;
        tables.screenings.insert(
            id,
            ScreeningRow {
                movie_id: new.movie_id,
                show_date: new.slot.date,
                show_hour: new.slot.hour,
                seats: new.seat_map.encode(),
            },
        );
        Ok(Screening { id, movie_id: new.movie_id, slot: new.slot, seat_map: new.seat_map })
    }

    async fn save_screening(&self, screening: &Screening) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let row = tables
            .screenings
            .get_mut(&screening.id)
            .ok_or(RepositoryError::NotFound { entity: "screening", id: screening.id })?;
        row.seats = screening.seat_map.encode();
        Ok(())
    }

    async fn delete_screening(&self, id: i64) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables
            .screenings
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound { entity: "screening", id })
    }

    async fn load_screenings_all(&self) -> Result<Vec<Screening>, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .screenings
            .iter()
            .map(|(&id, row)| self.screening_from_row(id, row))
            .collect()
    }

    async fn load_booking(&self, id: i64) -> Result<Booking, RepositoryError> {
        let tables = self.tables.read().await;
        let row = tables
            .bookings
            .get(&id)
            .ok_or(RepositoryError::NotFound { entity: "booking", id })?;
        booking_from_row(id, row)
    }

    async fn create_booking(&self, new: NewBooking) -> Result<Booking, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.last_booking_id += 1;
        let id = tables.last_booking_id;
        tables.bookings.insert(
            id,
            BookingRow {
                screening_id: new.screening_id,
                username: new.username.clone(),
                seats: encode_seat_list(&new.seats),
            },
        );
        Ok(Booking {
            id,
            screening_id: new.screening_id,
            username: new.username,
            seats: new.seats,
        })
    }

    async fn delete_booking(&self, id: i64) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables
            .bookings
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound { entity: "booking", id })
    }

    async fn load_bookings_by_screening(
        &self,
        screening_id: i64,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .bookings
            .iter()
            .filter(|(_, row)| row.screening_id == screening_id)
            .map(|(&id, row)| booking_from_row(id, row))
            .collect()
    }

    async fn load_bookings_by_user(
        &self,
        username: &str,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .bookings
            .iter()
            .filter(|(_, row)| row.username == username)
            .map(|(&id, row)| booking_from_row(id, row))
            .collect()
    }

    async fn load_movie(&self, id: i64) -> Result<Movie, RepositoryError> {
        let tables = self.tables.read().await;
        tables
            .movies
            .get(&id)
            .map(|row| movie_from_row(id, row))
            .ok_or(RepositoryError::NotFound { entity: "movie", id })
    }

    async fn load_movies_all(&self) -> Result<Vec<Movie>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut movies: Vec<Movie> = tables
            .movies
            .iter()
            .map(|(&id, row)| movie_from_row(id, row))
            .collect();
        movies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(movies)
    }

    async fn create_movie(&self, new: NewMovie) -> Result<Movie, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.last_movie_id += 1;
        let id = tables.last_movie_id;
        tables.movies.insert(
            id,
            MovieRow {
                name: new.name.clone(),
                genre: new.genre.clone(),
                year: new.year,
                director: new.director.clone(),
                description: new.description.clone(),
            },
        );
        Ok(Movie {
            id,
            name: new.name,
            genre: new.genre,
            year: new.year,
            director: new.director,
            description: new.description,
        })
    }

    async fn delete_movie(&self, id: i64) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables
            .movies
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound { entity: "movie", id })
    }
}
