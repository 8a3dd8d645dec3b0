use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::models::NewMovie;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/movies", get(list_movies).post(create_movie).delete(delete_movie))
}

// GET /api/movies
async fn list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let movies = state
        .repository
        .load_movies_all()
        .await
        .map_err(super::repo_status)?;
    Ok(Json(movies))
}

#[derive(Debug, Deserialize)]
struct CreateMovieRequest {
    name: String,
    genre: String,
    year: i32,
    director: String,
    description: String,
}

// POST /api/movies
async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateMovieRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "movie name must not be empty".to_string()));
    }
    let movie = state
        .repository
        .create_movie(NewMovie {
            name: req.name,
            genre: req.genre,
            year: req.year,
            director: req.director,
            description: req.description,
        })
        .await
        .map_err(super::repo_status)?;
    Ok((StatusCode::CREATED, Json(movie)))
}

#[derive(Debug, Deserialize)]
struct DeleteQuery {
    id: i64,
}

// DELETE /api/movies?id=
//
// Removal order matters: each screening takes its bookings with it before
// the movie row goes.
async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DeleteQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // Fail early on an unknown id instead of cascading over nothing.
    state
        .repository
        .load_movie(params.id)
        .await
        .map_err(super::repo_status)?;

    let screenings = state
        .repository
        .load_screenings_all()
        .await
        .map_err(super::repo_status)?;
    for screening in screenings.into_iter().filter(|s| s.movie_id == params.id) {
        state
            .scheduler
            .delete(screening.id)
            .await
            .map_err(super::screenings::schedule_status)?;
    }
    state
        .repository
        .delete_movie(params.id)
        .await
        .map_err(super::repo_status)?;
    Ok(StatusCode::NO_CONTENT)
}
