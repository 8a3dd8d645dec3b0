//! PostgreSQL implementation of the repository.
//!
//! Raw queries with explicit binds; screenings keep their seat state in the
//! `seats` text column as the canonical bitstring, bookings as comma-joined
//! labels. A stored bitstring that no longer matches the configured room
//! layout surfaces as [`RepositoryError::InvalidSeatMap`] on load.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::models::booking::{decode_seat_list, encode_seat_list};
use crate::models::{
    Booking, Movie, NewBooking, NewMovie, NewScreening, RoomLayout, Screening, SeatMap, Slot,
};

use super::{Repository, RepositoryError};

type ScreeningRow = (i64, i64, NaiveDate, i16, String);

pub struct PostgresRepository {
    pool: PgPool,
    layout: RoomLayout,
}

impl PostgresRepository {
    pub async fn connect(
        database_url: &str,
        pool_size: u32,
        layout: RoomLayout,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self { pool, layout })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        info!("Migrations completed");
        Ok(())
    }

    fn screening_from_row(&self, row: ScreeningRow) -> Result<Screening, RepositoryError> {
        let (id, movie_id, show_date, show_hour, seats) = row;
        Ok(Screening {
            id,
            movie_id,
            slot: Slot::new(show_date, show_hour as u8),
            seat_map: SeatMap::decode(self.layout, &seats)?,
        })
    }
}

fn booking_from_row(row: (i64, i64, String, String)) -> Result<Booking, RepositoryError> {
    let (id, screening_id, username, seats) = row;
    Ok(Booking { id, screening_id, username, seats: decode_seat_list(&seats)? })
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn load_screening(&self, id: i64) -> Result<Screening, RepositoryError> {
        let row = sqlx::query_as::<_, ScreeningRow>(
            "SELECT id, movie_id, show_date, show_hour, seats FROM screenings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound { entity: "screening", id })?;
        self.screening_from_row(row)
    }

    async fn create_screening(&self, new: NewScreening) -> Result<Screening, RepositoryError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO screenings (movie_id, show_date, show_hour, seats)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(new.movie_id)
        .bind(new.slot.date)
        .bind(new.slot.hour as i16)
        .bind(new.seat_map.encode())
        .fetch_one(&self.pool)
        .await?;
        Ok(Screening { id, movie_id: new.movie_id, slot: new.slot, seat_map: new.seat_map })
    }

    async fn save_screening(&self, screening: &Screening) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE screenings SET seats = $1 WHERE id = $2")
            .bind(screening.seat_map.encode())
            .bind(screening.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "screening", id: screening.id });
        }
        Ok(())
    }

    async fn delete_screening(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM screenings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "screening", id });
        }
        Ok(())
    }

    async fn load_screenings_all(&self) -> Result<Vec<Screening>, RepositoryError> {
        let rows = sqlx::query_as::<_, ScreeningRow>(
            "SELECT id, movie_id, show_date, show_hour, seats
             FROM screenings
             ORDER BY show_date, show_hour",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|row| self.screening_from_row(row)).collect()
    }

    async fn load_booking(&self, id: i64) -> Result<Booking, RepositoryError> {
        let row = sqlx::query_as::<_, (i64, i64, String, String)>(
            "SELECT id, screening_id, username, seats FROM bookings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound { entity: "booking", id })?;
        booking_from_row(row)
    }

    async fn create_booking(&self, new: NewBooking) -> Result<Booking, RepositoryError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO bookings (screening_id, username, seats)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(new.screening_id)
        .bind(&new.username)
        .bind(encode_seat_list(&new.seats))
        .fetch_one(&self.pool)
        .await?;
        Ok(Booking {
            id,
            screening_id: new.screening_id,
            username: new.username,
            seats: new.seats,
        })
    }

    async fn delete_booking(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "booking", id });
        }
        Ok(())
    }

    async fn load_bookings_by_screening(
        &self,
        screening_id: i64,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query_as::<_, (i64, i64, String, String)>(
            "SELECT id, screening_id, username, seats
             FROM bookings
             WHERE screening_id = $1
             ORDER BY id",
        )
        .bind(screening_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(booking_from_row).collect()
    }

    async fn load_bookings_by_user(
        &self,
        username: &str,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query_as::<_, (i64, i64, String, String)>(
            "SELECT id, screening_id, username, seats
             FROM bookings
             WHERE username = $1
             ORDER BY id",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(booking_from_row).collect()
    }

    async fn load_movie(&self, id: i64) -> Result<Movie, RepositoryError> {
        sqlx::query_as::<_, Movie>(
            "SELECT id, name, genre, year, director, description FROM movies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound { entity: "movie", id })
    }

    async fn load_movies_all(&self) -> Result<Vec<Movie>, RepositoryError> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT id, name, genre, year, director, description FROM movies ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn create_movie(&self, new: NewMovie) -> Result<Movie, RepositoryError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO movies (name, genre, year, director, description)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(&new.name)
        .bind(&new.genre)
        .bind(new.year)
        .bind(&new.director)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;
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
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "movie", id });
        }
        Ok(())
    }
}
