/*!
 * Bounded pool of backend sessions with idle eviction.
 *
 * Sessions are keyed (for translation backends, by language pair) and handed
 * out as leases. At most `max_sessions` leases exist at once; further
 * `acquire` calls wait. A dropped lease returns its session to the idle list,
 * and idle sessions older than `idle_timeout` are discarded on the next
 * acquire. The pool is an explicit handle owned by whoever builds the port.
 */

use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::errors::PortError;

struct IdleSession<S> {
    key: String,
    session: S,
    since: Instant,
}

/// Pool of reusable sessions of type `S`
pub struct SessionPool<S> {
    idle: Arc<Mutex<Vec<IdleSession<S>>>>,
    permits: Arc<Semaphore>,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl<S> SessionPool<S> {
    pub fn new(max_sessions: usize, idle_timeout: Duration) -> Self {
        let max_sessions = max_sessions.max(1);
        Self {
            idle: Arc::new(Mutex::new(Vec::new())),
            permits: Arc::new(Semaphore::new(max_sessions)),
            max_sessions,
            idle_timeout,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Sessions currently parked in the idle list
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Leases currently held
    pub fn active_count(&self) -> usize {
        self.max_sessions - self.permits.available_permits()
    }

    /// Lease a session for `key`, reusing an idle one or building one with `create`
    pub async fn acquire<F>(&self, key: &str, create: F) -> Result<SessionLease<S>, PortError>
    where
        F: FnOnce() -> S,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PortError::Unavailable("session pool closed".to_string()))?;

        let reused = {
            let mut idle = self.idle.lock();
            let before = idle.len();
            idle.retain(|s| s.since.elapsed() < self.idle_timeout);
            if idle.len() < before {
                debug!("Evicted {} idle session(s)", before - idle.len());
            }
            let found = idle.iter().position(|s| s.key == key).map(|index| idle.remove(index).session);
            // Leased plus idle sessions never exceed the pool size
            if found.is_none() && !idle.is_empty() && idle.len() + self.active_count() > self.max_sessions {
                let oldest = idle.remove(0);
                debug!("Evicted idle session '{}' to make room for '{}'", oldest.key, key);
            }
            found
        };

        Ok(SessionLease {
            key: key.to_string(),
            session: Some(reused.unwrap_or_else(create)),
            idle: Arc::clone(&self.idle),
            _permit: permit,
        })
    }

    /// Stop handing out leases; waiting and future `acquire` calls fail
    pub fn close(&self) {
        self.permits.close();
        self.idle.lock().clear();
    }
}

/// A leased session; returned to the pool on drop
pub struct SessionLease<S> {
    key: String,
    session: Option<S>,
    idle: Arc<Mutex<Vec<IdleSession<S>>>>,
    _permit: OwnedSemaphorePermit,
}

impl<S> SessionLease<S> {
    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut S> {
        self.session.as_mut()
    }

    /// Drop the session instead of returning it, e.g. after a backend error
    pub fn discard(mut self) {
        self.session = None;
    }
}

impl<S> Drop for SessionLease<S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.idle.lock().push(IdleSession {
                key: std::mem::take(&mut self.key),
                session,
                since: Instant::now(),
            });
        }
    }
}
