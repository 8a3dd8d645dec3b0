//! Persistence boundary.
//!
//! The engine talks to storage only through [`Repository`]. Screenings
//! persist their seat state as the bitstring from `models::seat_map`,
//! bookings persist their seats as comma-joined labels; everything else
//! about the schema belongs to the implementation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::seat::ParseSeatError;
use crate::models::seat_map::SeatMapError;
use crate::models::{Booking, Movie, NewBooking, NewMovie, NewScreening, Screening};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("stored seat map is invalid: {0}")]
    InvalidSeatMap(#[from] SeatMapError),
    #[error("stored seat list is invalid: {0}")]
    InvalidSeatList(#[from] ParseSeatError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

#[async_trait]
pub trait Repository: Send + Sync {
    async fn load_screening(&self, id: i64) -> Result<Screening, RepositoryError>;
    async fn create_screening(&self, new: NewScreening) -> Result<Screening, RepositoryError>;
    /// Persists the screening's current seat map. Slot and movie are fixed
    /// at creation and never rewritten.
    async fn save_screening(&self, screening: &Screening) -> Result<(), RepositoryError>;
    async fn delete_screening(&self, id: i64) -> Result<(), RepositoryError>;
    async fn load_screenings_all(&self) -> Result<Vec<Screening>, RepositoryError>;

    async fn load_booking(&self, id: i64) -> Result<Booking, RepositoryError>;
    async fn create_booking(&self, new: NewBooking) -> Result<Booking, RepositoryError>;
    async fn delete_booking(&self, id: i64) -> Result<(), RepositoryError>;
    async fn load_bookings_by_screening(
        &self,
        screening_id: i64,
    ) -> Result<Vec<Booking>, RepositoryError>;
    async fn load_bookings_by_user(&self, username: &str)
        -> Result<Vec<Booking>, RepositoryError>;

    async fn load_movie(&self, id: i64) -> Result<Movie, RepositoryError>;
    async fn load_movies_all(&self) -> Result<Vec<Movie>, RepositoryError>;
    async fn create_movie(&self, new: NewMovie) -> Result<Movie, RepositoryError>;
    async fn delete_movie(&self, id: i64) -> Result<(), RepositoryError>;
}
