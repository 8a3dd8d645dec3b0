use std::fmt;

use chrono::NaiveDate;

use crate::models::SeatMap;

/// A show date plus its start hour. The cinema schedules on whole hours,
/// so minutes never enter the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    pub date: NaiveDate,
    pub hour: u8,
}

impl Slot {
    pub fn new(date: NaiveDate, hour: u8) -> Self {
        Slot { date, hour }
    }

    /// A slot is past once its hour is reached: on the show date the
    /// screening stops being eligible at the top of its start hour.
    pub fn is_past(&self, now: Slot) -> bool {
        self.date < now.date || (self.date == now.date && self.hour <= now.hour)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:00", self.date, self.hour)
    }
}

/// One scheduled showing of a movie, with its own seat inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screening {
    pub id: i64,
    pub movie_id: i64,
    pub slot: Slot,
    pub seat_map: SeatMap,
}

impl Screening {
    pub fn total_seats(&self) -> u32 {
        self.seat_map.total()
    }

    pub fn booked_seats(&self) -> u32 {
        self.seat_map.booked_count()
    }

    pub fn available_seats(&self) -> u32 {
        self.seat_map.available_count()
    }
}

/// A screening about to be persisted; the repository assigns the id.
#[derive(Debug, Clone)]
pub struct NewScreening {
    pub movie_id: i64,
    pub slot: Slot,
    pub seat_map: SeatMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn slot_is_past_once_its_hour_is_reached() {
        let now = Slot::new(date(2025, 6, 1), 18);
        assert!(Slot::new(date(2025, 6, 1), 18).is_past(now));
        assert!(Slot::new(date(2025, 6, 1), 17).is_past(now));
        assert!(Slot::new(date(2025, 5, 31), 23).is_past(now));
        assert!(!Slot::new(date(2025, 6, 1), 19).is_past(now));
        assert!(!Slot::new(date(2025, 6, 2), 0).is_past(now));
    }

    #[test]
    fn earlier_date_is_past_even_with_a_later_hour() {
        let now = Slot::new(date(2025, 6, 1), 8);
        assert!(Slot::new(date(2025, 5, 31), 23).is_past(now));
        assert!(!Slot::new(date(2025, 6, 2), 0).is_past(now));
    }

    #[test]
    fn slots_order_by_date_then_hour() {
        let mut slots = vec![
            Slot::new(date(2025, 6, 2), 0),
            Slot::new(date(2025, 6, 1), 19),
            Slot::new(date(2025, 6, 1), 18),
        ];
        slots.sort();
        assert_eq!(
            slots,
            vec![
                Slot::new(date(2025, 6, 1), 18),
                Slot::new(date(2025, 6, 1), 19),
                Slot::new(date(2025, 6, 2), 0),
            ]
        );
    }

    #[test]
    fn slot_display_pads_the_hour() {
        assert_eq!(Slot::new(date(2025, 6, 1), 8).to_string(), "2025-06-01 08:00");
        assert_eq!(Slot::new(date(2025, 6, 1), 18).to_string(), "2025-06-01 18:00");
    }
}
