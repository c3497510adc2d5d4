use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use autoscale_cuckoo_filter::CuckooFilter;

use crate::store::UserStore;

/// Expected capacity and false-positive rate.
/// Tune these based on real user counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

/// Probabilistic set of taken usernames. A miss is definitive; a hit still
/// needs confirming against the cache or the store.
pub struct UsernameFilter {
    filter: RwLock<CuckooFilter<str>>,
}

impl Default for UsernameFilter {
    fn default() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
        }
    }
}

impl UsernameFilter {
    /// Check if a username might exist (false positives possible)
    pub fn might_exist(&self, username: &str) -> bool {
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(username)
    }

    pub fn insert(&self, username: &str) {
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(username);
    }

    pub fn remove(&self, username: &str) {
        self.filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(username);
    }

    /// Insert a batch of usernames under one write lock
    fn insert_batch(&self, usernames: &[String]) {
        let mut filter = self.filter.write().unwrap_or_else(PoisonError::into_inner);

        for username in usernames {
            filter.add(username.as_str());
        }
    }

    /// Loads every stored username, `batch_size` at a time.
    pub async fn warmup<S>(&self, store: &S, batch_size: usize) -> Result<()>
    where
        S: UserStore + ?Sized,
    {
        let usernames = store
            .usernames()
            .await
            .context("failed to load usernames for filter warmup")?;

        for batch in usernames.chunks(batch_size.max(1)) {
            self.insert_batch(batch);
        }

        tracing::info!("Username filter warmup complete: {} users", usernames.len());
        Ok(())
    }
}
