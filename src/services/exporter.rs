//! Screening report projection.
//!
//! Turns programme entries into flat report rows and renders them as CSV
//! with the dashboard's column layout. Pure functions, no state.

use chrono::NaiveDate;
use serde::Serialize;

use crate::services::scheduler::ProgrammeEntry;

pub const CSV_HEADER: &str = "Movie Title,Date,Time,Total Seats,Booked Seats,Available Seats";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub movie_name: String,
    pub date: NaiveDate,
    pub hour: u8,
    pub total_seats: u32,
    pub booked_seats: u32,
    pub available_seats: u32,
}

pub fn rows(entries: &[ProgrammeEntry]) -> Vec<ReportRow> {
    entries
        .iter()
        .map(|entry| ReportRow {
            movie_name: entry.movie.name.clone(),
            date: entry.screening.slot.date,
            hour: entry.screening.slot.hour,
            total_seats: entry.screening.total_seats(),
            booked_seats: entry.screening.booked_seats(),
            available_seats: entry.screening.available_seats(),
        })
        .collect()
}

pub fn render_csv(rows: &[ReportRow]) -> String {
    let mut out = String::from(CSV_HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(&csv_field(&row.movie_name));
        out.push(',');
        out.push_str(&row.date.to_string());
        out.push(',');
        out.push_str(&format!("{:02}:00", row.hour));
        out.push(',');
        out.push_str(&row.total_seats.to_string());
        out.push(',');
        out.push_str(&row.booked_seats.to_string());
        out.push(',');
        out.push_str(&row.available_seats.to_string());
    }
    out
}

// Movie titles are free text; everything else in a row is numeric or an
// ISO date and never needs quoting.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
