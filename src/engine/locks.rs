//! Per-round serialization guard.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::game::entities::RoundId;

/// Hands out one mutex per round so that no two actions on the same round
/// are ever applied concurrently. Different rounds proceed in parallel.
#[derive(Debug, Default)]
pub struct RoundLocks {
    locks: Mutex<HashMap<RoundId, Arc<Mutex<()>>>>,
}

impl RoundLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the round's guard, creating it on first use. Callers holding
    /// the guard are the round's single writer.
    pub async fn acquire(&self, round_id: RoundId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(round_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop the registry entry of a round that will see no further actions.
    pub async fn forget(&self, round_id: RoundId) {
        self.locks.lock().await.remove(&round_id);
    }
}
