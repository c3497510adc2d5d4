use moka::future::Cache;
use std::time::Duration;

/// Recently confirmed taken usernames. Only positives are stored.
pub struct UsernameCache {
    cache: Cache<String, bool>,
}

impl Default for UsernameCache {
    fn default() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(500_000) // tune based on memory
                .time_to_live(Duration::from_secs(86400)) // 24h TTL
                .build(),
        }
    }
}

impl UsernameCache {
    /// Mark a single username as taken
    pub async fn mark_taken(&self, username: &str) {
        self.cache.insert(username.to_string(), true).await;
    }

    /// Check if username is taken
    pub async fn is_taken(&self, username: &str) -> bool {
        self.cache.get(username).await.unwrap_or(false)
    }

    pub async fn forget(&self, username: &str) {
        self.cache.invalidate(username).await;
    }
}
