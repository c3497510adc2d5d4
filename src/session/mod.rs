mod flow;

pub use flow::{Flow, PendingAction, Session};

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use moka::future::Cache;

/// Sessions keyed by the login token's `jti`. An idle session expires and
/// takes every held proposal with it.
pub struct SessionRegistry {
    sessions: Cache<String, Arc<Mutex<Session>>>,
}

impl SessionRegistry {
    pub fn new(idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Runs `f` against the session, starting a fresh one if none is live.
    pub async fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let session = self
            .sessions
            .get_with(session_id.to_string(), async {
                Arc::new(Mutex::new(Session::default()))
            })
            .await;

        let mut guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub async fn end(&self, session_id: &str) {
        self.sessions.invalidate(session_id).await;
    }
}
