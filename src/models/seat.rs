use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

/// One seat in the room. `row` is the row letter, `number` is 1-based
/// within the row.
#[derive(Debug, Clone, Copy)]
pub struct Seat {
    pub row: char,
    pub number: u32,
    pub booked: bool,
}

impl Seat {
    pub fn new(row: char, number: u32, booked: bool) -> Self {
        Seat { row, number, booked }
    }

    /// Label form used in booking rows and API payloads, e.g. "A8".
    pub fn label(&self) -> String {
        self.to_string()
    }
}

// Identity is (row, number) only. Booked state is checked and flipped on
// seats found by identity, so it must never participate in equality.
impl PartialEq for Seat {
    fn eq(&self, other: &Self) -> bool {
        self.row == other.row && self.number == other.number
    }
}

impl Eq for Seat {}

impl Hash for Seat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.row.hash(state);
        self.number.hash(state);
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed seat label {0:?}")]
pub struct ParseSeatError(pub String);

impl FromStr for Seat {
    type Err = ParseSeatError;

    /// Parses labels of the form "A8": one uppercase row letter followed
    /// by a 1-based seat number. Parsed seats are free; callers decide
    /// what the flag should be.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let row = match chars.next() {
            Some(c) if c.is_ascii_uppercase() => c,
            _ => return Err(ParseSeatError(s.to_string())),
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseSeatError(s.to_string()));
        }
        let number: u32 = digits.parse().map_err(|_| ParseSeatError(s.to_string()))?;
        if number == 0 {
            return Err(ParseSeatError(s.to_string()));
        }
        Ok(Seat::new(row, number, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_ignores_booked_state() {
        let free = Seat::new('A', 8, false);
        let booked = Seat::new('A', 8, true);
        assert_eq!(free, booked);
        assert_ne!(free, Seat::new('A', 9, false));
        assert_ne!(free, Seat::new('B', 8, false));
    }

    #[test]
    fn hashing_follows_identity() {
        let mut set = HashSet::new();
        set.insert(Seat::new('D', 10, false));
        assert!(set.contains(&Seat::new('D', 10, true)));
        assert!(!set.contains(&Seat::new('D', 9, true)));
    }

    #[test]
    fn label_round_trips() {
        let seat = Seat::new('C', 7, true);
        assert_eq!(seat.label(), "C7");
        let parsed: Seat = "C7".parse().unwrap();
        assert_eq!(parsed, seat);
        assert!(!parsed.booked);
    }

    #[test]
    fn rejects_malformed_labels() {
        for bad in ["", "8", "A", "A0", "a8", "AB", "8A", "A8x", "A-1"] {
            assert!(bad.parse::<Seat>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn accepts_multi_digit_and_padded_numbers() {
        assert_eq!("B12".parse::<Seat>().unwrap(), Seat::new('B', 12, false));
        assert_eq!("A08".parse::<Seat>().unwrap(), Seat::new('A', 8, false));
    }
}
