use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::services::scheduler::{ProgrammeEntry, ProgrammeFilter, ScheduleError, ScreeningOrder};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/screenings",
            get(list_screenings)
                .post(schedule_screening)
                .delete(delete_screening),
        )
        .route("/seats", get(get_seats))
}

/* ---------- programme listing ---------- */

#[derive(Debug, Deserialize)]
struct ProgrammeQuery {
    query: Option<String>,
    date: Option<NaiveDate>,
    sort: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScreeningResponse {
    id: i64,
    movie_id: i64,
    movie_name: String,
    date: NaiveDate,
    hour: u8,
    total_seats: u32,
    booked_seats: u32,
    available_seats: u32,
}

impl From<&ProgrammeEntry> for ScreeningResponse {
    fn from(entry: &ProgrammeEntry) -> Self {
        ScreeningResponse {
            id: entry.screening.id,
            movie_id: entry.movie.id,
            movie_name: entry.movie.name.clone(),
            date: entry.screening.slot.date,
            hour: entry.screening.slot.hour,
            total_seats: entry.screening.total_seats(),
            booked_seats: entry.screening.booked_seats(),
            available_seats: entry.screening.available_seats(),
        }
    }
}

// GET /api/screenings?query=&date=&sort=
async fn list_screenings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProgrammeQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let order = match params.sort.as_deref() {
        None | Some("date") => ScreeningOrder::StartTime,
        Some("title") => ScreeningOrder::Title,
        Some(other) => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("unknown sort {other:?}, expected \"date\" or \"title\""),
            ))
        }
    };
    let filter = ProgrammeFilter { query: params.query, date: params.date };
    let entries = state
        .scheduler
        .list_upcoming(&filter, order)
        .await
        .map_err(super::repo_status)?;
    let listing: Vec<ScreeningResponse> = entries.iter().map(ScreeningResponse::from).collect();
    let count = listing.len();
    Ok(Json(json!({
        "screenings": listing,
        "count": count,
    })))
}

/* ---------- scheduling ---------- */

#[derive(Debug, Deserialize)]
struct ScheduleRequest {
    movie_id: i64,
    date: NaiveDate,
    hour: u8,
}

#[derive(Debug, Serialize)]
struct ScheduledResponse {
    id: i64,
    movie_id: i64,
    date: NaiveDate,
    hour: u8,
    total_seats: u32,
    available_seats: u32,
}

// POST /api/screenings
async fn schedule_screening(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScheduleRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let screening = state
        .scheduler
        .schedule(req.movie_id, req.date, req.hour)
        .await
        .map_err(schedule_status)?;
    Ok((
        StatusCode::CREATED,
        Json(ScheduledResponse {
            id: screening.id,
            movie_id: screening.movie_id,
            date: screening.slot.date,
            hour: screening.slot.hour,
            total_seats: screening.total_seats(),
            available_seats: screening.available_seats(),
        }),
    ))
}

pub(crate) fn schedule_status(err: ScheduleError) -> (StatusCode, String) {
    let message = err.to_string();
    match err {
        ScheduleError::InvalidHour(_) => (StatusCode::BAD_REQUEST, message),
        ScheduleError::UnknownMovie(_) => (StatusCode::NOT_FOUND, message),
        ScheduleError::SlotConflict { .. } => (StatusCode::CONFLICT, message),
        ScheduleError::PastSchedulingAttempt(_) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        ScheduleError::Repository(cause) => super::repo_status(cause),
    }
}

/* ---------- seat view ---------- */

#[derive(Debug, Deserialize)]
struct SeatsQuery {
    screening_id: i64,
}

#[derive(Debug, Serialize)]
struct SeatResponse {
    label: String,
    row: char,
    number: u32,
    booked: bool,
}

#[derive(Debug, Serialize)]
struct SeatStateResponse {
    screening_id: i64,
    total_seats: u32,
    booked_seats: u32,
    available_seats: u32,
    seats: Vec<SeatResponse>,
}

// GET /api/seats?screening_id=
async fn get_seats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeatsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let screening = state
        .repository
        .load_screening(params.screening_id)
        .await
        .map_err(super::repo_status)?;
    let seats = screening
        .seat_map
        .seats()
        .iter()
        .map(|seat| SeatResponse {
            label: seat.label(),
            row: seat.row,
            number: seat.number,
            booked: seat.booked,
        })
        .collect();
    Ok(Json(SeatStateResponse {
        screening_id: screening.id,
        total_seats: screening.total_seats(),
        booked_seats: screening.booked_seats(),
        available_seats: screening.available_seats(),
        seats,
    }))
}

/* ---------- deletion ---------- */

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    id: i64,
}

// DELETE /api/screenings?id=
async fn delete_screening(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .scheduler
        .delete(params.id)
        .await
        .map_err(schedule_status)?;
    Ok(StatusCode::NO_CONTENT)
}
