pub mod clock;
pub mod config;
pub mod controllers;
pub mod models;
pub mod repository;
pub mod services;

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::Config;
use crate::repository::Repository;
use crate::services::{BookingLedger, ScreeningLocks, ScreeningScheduler};

// Shared state for the whole application. The scheduler and the ledger
// share one lock registry, so reserve/cancel/delete on a screening are
// serialized no matter which service drives them.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn Repository>,
    pub scheduler: ScreeningScheduler,
    pub ledger: BookingLedger,
    pub config: Config,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn Repository>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Arc<Self> {
        let locks = Arc::new(ScreeningLocks::new());
        let scheduler = ScreeningScheduler::new(
            repository.clone(),
            clock.clone(),
            locks.clone(),
            config.room.layout(),
        );
        let ledger = BookingLedger::new(repository.clone(), clock, locks);
        Arc::new(Self { repository, scheduler, ledger, config })
    }
}
