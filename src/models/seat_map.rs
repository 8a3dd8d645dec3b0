//! Per-screening seat inventory.
//!
//! A screening's seats live in a fixed rectangular layout and are persisted
//! as a string of `'0'`/`'1'` characters, one per seat in layout order
//! (`'0'` = free, `'1'` = booked). Decoding is strict: a length mismatch or
//! a stray character is an error, never padded or truncated away.

use thiserror::Error;

use crate::models::Seat;

/// Room geometry. Seats are numbered row by row: index `i` maps to row
/// `'A' + i / seats_per_row` and number `i % seats_per_row + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomLayout {
    pub seats_per_row: u32,
    pub total_seats: u32,
}

impl RoomLayout {
    /// The single-room cinema: 50 seats, 10 per row, rows A through E.
    pub const DEFAULT: RoomLayout = RoomLayout {
        seats_per_row: 10,
        total_seats: 50,
    };

    /// Callers are expected to keep `seats_per_row >= 1`, `total_seats >= 1`
    /// and at most 26 rows; configuration loading enforces this.
    pub fn new(seats_per_row: u32, total_seats: u32) -> Self {
        RoomLayout { seats_per_row, total_seats }
    }

    pub fn rows(&self) -> u32 {
        self.total_seats.div_ceil(self.seats_per_row)
    }

    fn seat_at_index(&self, index: u32) -> Seat {
        let row = (b'A' + (index / self.seats_per_row) as u8) as char;
        let number = index % self.seats_per_row + 1;
        Seat::new(row, number, false)
    }

    fn index_of(&self, seat: &Seat) -> Option<u32> {
        if !seat.row.is_ascii_uppercase() {
            return None;
        }
        if seat.number < 1 || seat.number > self.seats_per_row {
            return None;
        }
        let row_index = seat.row as u32 - 'A' as u32;
        let index = row_index * self.seats_per_row + seat.number - 1;
        (index < self.total_seats).then_some(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatMapError {
    #[error("seat string holds {got} characters, layout expects {expected}")]
    LengthMismatch { expected: u32, got: u32 },
    #[error("seat string has {found:?} at position {position}, expected '0' or '1'")]
    InvalidChar { position: usize, found: char },
    #[error("seat {0} is outside the room layout")]
    UnknownSeat(Seat),
}

/// Ordered, fixed-length seat inventory of one screening.
#[derive(Debug, Clone)]
pub struct SeatMap {
    layout: RoomLayout,
    seats: Vec<Seat>,
}

impl SeatMap {
    /// A fresh map with every seat free.
    pub fn all_free(layout: RoomLayout) -> Self {
        let seats = (0..layout.total_seats)
            .map(|i| layout.seat_at_index(i))
            .collect();
        SeatMap { layout, seats }
    }

    /// Rebuilds a map from its serialized form.
    pub fn decode(layout: RoomLayout, bits: &str) -> Result<Self, SeatMapError> {
        let got = bits.chars().count() as u32;
        if got != layout.total_seats {
            return Err(SeatMapError::LengthMismatch {
                expected: layout.total_seats,
                got,
            });
        }
        let mut seats = Vec::with_capacity(layout.total_seats as usize);
        for (position, found) in bits.chars().enumerate() {
            let booked = match found {
                '0' => false,
                '1' => true,
                _ => return Err(SeatMapError::InvalidChar { position, found }),
            };
            let mut seat = layout.seat_at_index(position as u32);
            seat.booked = booked;
            seats.push(seat);
        }
        Ok(SeatMap { layout, seats })
    }

    /// Serialized form, the exact inverse of [`SeatMap::decode`].
    pub fn encode(&self) -> String {
        self.seats
            .iter()
            .map(|seat| if seat.booked { '1' } else { '0' })
            .collect()
    }

    pub fn layout(&self) -> RoomLayout {
        self.layout
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Current state of the seat at `(row, number)`, if the layout has one.
    pub fn seat_at(&self, row: char, number: u32) -> Option<Seat> {
        let probe = Seat::new(row, number, false);
        let index = self.layout.index_of(&probe)?;
        Some(self.seats[index as usize])
    }

    /// Flips one seat's booked flag in place.
    pub fn set_booked(&mut self, seat: &Seat, booked: bool) -> Result<(), SeatMapError> {
        let index = self
            .layout
            .index_of(seat)
            .ok_or(SeatMapError::UnknownSeat(*seat))?;
        self.seats[index as usize].booked = booked;
        Ok(())
    }

    pub fn total(&self) -> u32 {
        self.layout.total_seats
    }

    pub fn booked_count(&self) -> u32 {
        self.seats.iter().filter(|seat| seat.booked).count() as u32
    }

    pub fn available_count(&self) -> u32 {
        self.total() - self.booked_count()
    }
}

// Seat equality deliberately ignores the booked flag, so map equality
// cannot lean on Vec<Seat>: it has to compare booked state explicitly.
impl PartialEq for SeatMap {
    fn eq(&self, other: &Self) -> bool {
        self.layout == other.layout
            && self.seats.len() == other.seats.len()
            && self
                .seats
                .iter()
                .zip(&other.seats)
                .all(|(a, b)| a == b && a.booked == b.booked)
    }
}

impl Eq for SeatMap {}
