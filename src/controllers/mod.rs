//! HTTP surface. Each module exposes a `routes()` router merged under
//! `/api`; handlers translate engine errors into status codes and leave
//! the business rules to the services.

pub mod bookings;
pub mod movies;
pub mod reports;
pub mod screenings;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;

use crate::repository::RepositoryError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(screenings::routes())
        .merge(bookings::routes())
        .merge(movies::routes())
        .merge(reports::routes())
}

// Missing rows are the caller's problem; anything else is ours and gets
// logged before the details are withheld from the response.
pub(crate) fn repo_status(err: RepositoryError) -> (StatusCode, String) {
    if err.is_not_found() {
        (StatusCode::NOT_FOUND, err.to_string())
    } else {
        tracing::error!(error = %err, "repository failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    }
}
