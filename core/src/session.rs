use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use securescape_types::{SessionId, UserId};

/// Maps a session to the user it is authenticated as.
pub trait SessionRegistry: Send + Sync {
    /// Resolve the session's user, establishing one if the registry knows how.
    ///
    /// Once a session has resolved to a user it must keep resolving to that
    /// same user for the rest of its lifetime.
    fn resolve_or_bootstrap(&self, session: &SessionId) -> Option<UserId>;
}

/// Registry that logs every new session in as a fixed demo victim.
///
/// This stands in for a real login: the CSRF demos need a victim whose
/// browser already carries an authenticated session. With no victim
/// configured it behaves as a plain lookup table.
///
/// Bindings are never evicted: the map grows by one entry for every session
/// that reaches a CSRF route over the life of the process.
#[derive(Debug, Default)]
pub struct DemoSessionRegistry {
    victim: Option<UserId>,
    bindings: Mutex<HashMap<SessionId, UserId>>,
}

impl DemoSessionRegistry {
    #[must_use]
    pub fn new(victim: Option<UserId>) -> Self {
        Self {
            victim,
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// Attach `user` to `session`, replacing any earlier binding.
    pub fn bind(&self, session: SessionId, user: UserId) {
        self.lock().insert(session, user);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, UserId>> {
        self.bindings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionRegistry for DemoSessionRegistry {
    fn resolve_or_bootstrap(&self, session: &SessionId) -> Option<UserId> {
        let mut bindings = self.lock();
        if let Some(user) = bindings.get(session) {
            return Some(*user);
        }
        let victim = self.victim?;
        bindings.insert(session.clone(), victim);
        tracing::info!(session = %session, user = %victim, "Attached demo victim to new session");
        Some(victim)
    }
}
