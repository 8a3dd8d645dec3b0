use crate::models::seat::{ParseSeatError, Seat};

/// A customer's hold on a set of seats for one screening. The seats are
/// stored as comma-joined labels, e.g. `"A8,D10"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: i64,
    pub screening_id: i64,
    pub username: String,
    pub seats: Vec<Seat>,
}

impl Booking {
    /// Human-facing seat list, e.g. `"A8, D10"`.
    pub fn seat_summary(&self) -> String {
        self.seats
            .iter()
            .map(Seat::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A booking about to be persisted; the repository assigns the id.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub screening_id: i64,
    pub username: String,
    pub seats: Vec<Seat>,
}

/// Serializes seats into the stored comma-joined label form.
pub fn encode_seat_list(seats: &[Seat]) -> String {
    seats
        .iter()
        .map(Seat::label)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses the stored form back into seats. Seats held by a booking are
/// booked by definition, so the flag comes back set.
pub fn decode_seat_list(s: &str) -> Result<Vec<Seat>, ParseSeatError> {
    s.split(',')
        .map(|label| {
            let mut seat: Seat = label.parse()?;
            seat.booked = true;
            Ok(seat)
        })
        .collect()
}
