pub mod exporter;
pub mod ledger;
pub mod locks;
pub mod scheduler;

pub use ledger::{BookingLedger, LedgerError};
pub use locks::ScreeningLocks;
pub use scheduler::{
    ProgrammeEntry, ProgrammeFilter, ScheduleError, ScreeningOrder, ScreeningScheduler,
};
