//! Per-screening mutual exclusion.
//!
//! The store itself offers plain CRUD, so the check-then-mark sequence in
//! reserve/cancel has to be made atomic here: every operation that mutates
//! one screening's seat map takes that screening's lock first. Operations on
//! different screenings proceed concurrently. Scheduling uses a separate
//! single guard, because a slot conflict is a property of the whole room,
//! not of one screening.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard, OwnedMutexGuard};

#[derive(Default)]
pub struct ScreeningLocks {
    // Registry entries are created on first use and removed when the
    // screening is deleted, so the map stays proportional to the live
    // screening count.
    screenings: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
    slots: AsyncMutex<()>,
}

impl ScreeningLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes reserve/cancel/delete against one screening. The guard is
    /// owned, so it can be held across repository awaits.
    pub async fn lock_screening(&self, screening_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.screenings.lock().expect("lock registry poisoned");
            // An entry with no holder and no waiter is indistinguishable
            // from a fresh one, so idle entries are swept here. This covers
            // lookups that re-created an entry for an already-deleted
            // screening after its `forget` ran.
            registry.retain(|_, lock| Arc::strong_count(lock) > 1);
            registry
                .entry(screening_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Serializes the conflict check and insert of new screenings. One
    /// shared room, one guard.
    pub async fn lock_slots(&self) -> MutexGuard<'_, ()> {
        self.slots.lock().await
    }

    /// Drops the registry entry of a deleted screening. Callers must have
    /// released the screening's guard first.
    pub fn forget(&self, screening_id: i64) {
        let mut registry = self.screenings.lock().expect("lock registry poisoned");
        registry.remove(&screening_id);
    }
}
