use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::model::UserId;

/// One async mutex per user. Every balance or ledger mutation for a user runs
/// while holding that user's guard; different users never contend.
#[derive(Default)]
pub struct UserLocks {
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(user_id).or_default().clone();
        lock.lock_owned().await
    }

    pub fn forget(&self, user_id: UserId) {
        self.locks.remove(&user_id);
    }
}
