use chrono::{Local, Timelike};

use crate::models::Slot;

/// Source of "now" for every temporal eligibility check. The engine never
/// reads system time directly, so the rules stay testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> Slot;
}

/// Wall clock truncated to hour granularity.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Slot {
        let now = Local::now();
        Slot::new(now.date_naive(), now.hour() as u8)
    }
}

/// A clock pinned to one slot, for tests and deterministic tooling.
pub struct FixedClock(pub Slot);

impl Clock for FixedClock {
    fn now(&self) -> Slot {
        self.0
    }
}
