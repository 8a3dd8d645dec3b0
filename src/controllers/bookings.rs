use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::seat::ParseSeatError;
use crate::models::Seat;
use crate::services::LedgerError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(get_user_bookings).post(create_booking))
        .route("/bookings/cancel", patch(cancel_booking))
}

/* ---------- helpers ---------- */

fn ledger_status(err: LedgerError) -> (StatusCode, String) {
    let message = err.to_string();
    match err {
        LedgerError::NoSeatsSelected => (StatusCode::BAD_REQUEST, message),
        LedgerError::UnknownSeat(_) => (StatusCode::NOT_FOUND, message),
        LedgerError::SeatUnavailable(_) => (StatusCode::CONFLICT, message),
        LedgerError::PastScreening(_) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        LedgerError::Repository(cause) => super::repo_status(cause),
    }
}

// Price is never stored; it is seat count times the configured per-seat
// price, rendered for display.
fn display_price(seat_count: u32, price_pence: u32) -> String {
    let total = seat_count * price_pence;
    format!("\u{a3} {}.{:02}", total / 100, total % 100)
}

fn seat_labels(seats: &[Seat]) -> Vec<String> {
    seats.iter().map(Seat::label).collect()
}

/* ---------- reservation ---------- */

#[derive(Debug, Deserialize)]
struct CreateBookingRequest {
    screening_id: i64,
    username: String,
    seats: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreateBookingResponse {
    id: i64,
    screening_id: i64,
    seats: Vec<String>,
    price: String,
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut selection = Vec::with_capacity(req.seats.len());
    for label in &req.seats {
        let seat: Seat = label
            .parse()
            .map_err(|err: ParseSeatError| (StatusCode::BAD_REQUEST, err.to_string()))?;
        selection.push(seat);
    }

    let booking = state
        .ledger
        .reserve(req.screening_id, &req.username, &selection)
        .await
        .map_err(ledger_status)?;
    let price = display_price(booking.seats.len() as u32, state.config.room.seat_price_pence);
    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            id: booking.id,
            screening_id: booking.screening_id,
            seats: seat_labels(&booking.seats),
            price,
        }),
    ))
}

/* ---------- listing ---------- */

#[derive(Debug, Deserialize)]
struct UserBookingsQuery {
    username: String,
}

#[derive(Debug, Serialize)]
struct UserBookingResponse {
    id: i64,
    screening_id: i64,
    movie_name: String,
    date: NaiveDate,
    hour: u8,
    seats: Vec<String>,
    price: String,
}

// GET /api/bookings?username=
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserBookingsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let bookings = state
        .repository
        .load_bookings_by_user(&params.username)
        .await
        .map_err(super::repo_status)?;

    let mut listing = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let screening = state
            .repository
            .load_screening(booking.screening_id)
            .await
            .map_err(super::repo_status)?;
        let movie = state
            .repository
            .load_movie(screening.movie_id)
            .await
            .map_err(super::repo_status)?;
        listing.push(UserBookingResponse {
            id: booking.id,
            screening_id: booking.screening_id,
            movie_name: movie.name,
            date: screening.slot.date,
            hour: screening.slot.hour,
            price: display_price(
                booking.seats.len() as u32,
                state.config.room.seat_price_pence,
            ),
            seats: seat_labels(&booking.seats),
        });
    }
    Ok(Json(listing))
}

/* ---------- cancellation ---------- */

#[derive(Debug, Deserialize)]
struct CancelRequest {
    booking_id: i64,
    username: String,
}

// PATCH /api/bookings/cancel
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancelRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let booking = state
        .repository
        .load_booking(req.booking_id)
        .await
        .map_err(super::repo_status)?;
    if booking.username != req.username {
        return Err((
            StatusCode::FORBIDDEN,
            "booking belongs to another customer".to_string(),
        ));
    }
    state.ledger.cancel(req.booking_id).await.map_err(ledger_status)?;
    Ok(StatusCode::NO_CONTENT)
}
