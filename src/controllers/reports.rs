use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::services::exporter;
use crate::services::scheduler::{ProgrammeFilter, ScreeningOrder};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/reports/screenings", get(screenings_report))
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    scope: Option<String>,
}

// GET /api/reports/screenings?scope=all|upcoming
async fn screenings_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQuery>,
) -> Result<Response, (StatusCode, String)> {
    let entries = match params.scope.as_deref() {
        None | Some("upcoming") => {
            state
                .scheduler
                .list_upcoming(&ProgrammeFilter::default(), ScreeningOrder::StartTime)
                .await
        }
        Some("all") => state.scheduler.list_all().await,
        Some(other) => {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("unknown scope {other:?}, expected \"all\" or \"upcoming\""),
            ))
        }
    }
    .map_err(super::repo_status)?;

    let csv = exporter::render_csv(&exporter::rows(&entries));
    Ok(Response::builder()
        .header("Content-Type", "text/csv")
        .body(Body::from(csv))
        .unwrap())
}
