//! Anti-forgery token issuance and the per-session token map.
//!
//! # Lifecycle
//!
//! A session holds at most one live token. [`TokenStore::generate`] creates
//! it when the form is loaded, [`TokenStore::rotate`] replaces it after every
//! accepted guarded mutation, and [`TokenStore::revoke`] drops it. There is no
//! timer expiry: rotation alone bounds a token to a single accepted use.
//!
//! # Comparison
//!
//! [`TokenStore::validate`] compares in constant time via `subtle`, so the
//! position of the first mismatching byte is not observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use securescape_types::{CsrfToken, SessionId};
use subtle::ConstantTimeEq;

/// Raw entropy per token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Source of fresh token values.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self) -> CsrfToken;
}

/// Production issuer: 32 bytes from the thread-local CSPRNG, URL-safe base64
/// without padding.
///
/// The RNG panics if the OS entropy source cannot seed it. That is treated as
/// a fatal startup condition rather than a per-request error.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRngIssuer;

impl TokenIssuer for OsRngIssuer {
    fn issue(&self) -> CsrfToken {
        let bytes: [u8; TOKEN_BYTES] = rand::random();
        CsrfToken::from_encoded(URL_SAFE_NO_PAD.encode(bytes))
    }
}

/// Deterministic issuer producing `{prefix}-1`, `{prefix}-2`, ...
///
/// Makes token values reproducible in tests and scripted demos. Never wire
/// this into a server that faces real traffic.
#[derive(Debug)]
pub struct SequentialIssuer {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIssuer {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl TokenIssuer for SequentialIssuer {
    fn issue(&self) -> CsrfToken {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        CsrfToken::from_encoded(format!("{}-{n}", self.prefix))
    }
}

/// Outcome of [`TokenStore::spend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Spend<T> {
    /// The candidate did not match a live token; the effect never ran.
    Rejected,
    /// The effect ran and the spent token was replaced by `next`.
    Applied { value: T, next: CsrfToken },
}

/// Process-wide map from session id to its single live token.
///
/// Every operation takes the same lock, so operations on one session are
/// linearizable: a `validate` racing a `rotate` sees either the old or the
/// new token in full. [`spend`](Self::spend) holds that lock while its effect
/// runs, so callers on an async runtime should invoke it from a blocking
/// task.
///
/// Entries leave the map only through [`revoke`](Self::revoke); a session
/// that loads the form and never returns keeps its token until exit.
pub struct TokenStore {
    issuer: Box<dyn TokenIssuer>,
    tokens: Mutex<HashMap<SessionId, CsrfToken>>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("live_tokens", &self.lock().len())
            .finish_non_exhaustive()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(OsRngIssuer)
    }
}

impl TokenStore {
    #[must_use]
    pub fn new(issuer: impl TokenIssuer + 'static) -> Self {
        Self {
            issuer: Box::new(issuer),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a fresh token for `session`, replacing any live one.
    pub fn generate(&self, session: &SessionId) -> CsrfToken {
        let token = self.issuer.issue();
        let replaced = self.lock().insert(session.clone(), token.clone());
        tracing::debug!(
            session = %session,
            replaced = replaced.is_some(),
            "Issued anti-forgery token"
        );
        token
    }

    /// True iff `session` has a live token equal to `candidate`.
    ///
    /// A missing candidate, a session with no token, and a mismatch all
    /// return `false`. Never mutates the map.
    #[must_use]
    pub fn validate(&self, session: &SessionId, candidate: Option<&str>) -> bool {
        token_matches(self.lock().get(session), candidate)
    }

    /// Replace the live token after it has been spent.
    pub fn rotate(&self, session: &SessionId) -> CsrfToken {
        let mut tokens = self.lock();
        self.rotate_locked(&mut tokens, session)
    }

    /// Validate `candidate`, run `effect`, then rotate, all under one lock.
    ///
    /// Two requests racing with the same token cannot both pass validation:
    /// the second one sees the rotated value. If `effect` fails the token is
    /// left live, since nothing was spent.
    pub fn spend<T, E>(
        &self,
        session: &SessionId,
        candidate: Option<&str>,
        effect: impl FnOnce() -> Result<T, E>,
    ) -> Result<Spend<T>, E> {
        let mut tokens = self.lock();
        if !token_matches(tokens.get(session), candidate) {
            return Ok(Spend::Rejected);
        }
        let value = effect()?;
        let next = self.rotate_locked(&mut tokens, session);
        Ok(Spend::Applied { value, next })
    }

    /// Drop the live token for `session`, if any.
    pub fn revoke(&self, session: &SessionId) {
        if self.lock().remove(session).is_some() {
            tracing::debug!(session = %session, "Revoked anti-forgery token");
        }
    }

    /// Number of sessions currently holding a live token.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn rotate_locked(
        &self,
        tokens: &mut HashMap<SessionId, CsrfToken>,
        session: &SessionId,
    ) -> CsrfToken {
        let token = self.issuer.issue();
        tokens.insert(session.clone(), token.clone());
        tracing::debug!(session = %session, "Rotated anti-forgery token");
        token
    }

    // The map holds no cross-entry invariant, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, CsrfToken>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn token_matches(live: Option<&CsrfToken>, candidate: Option<&str>) -> bool {
    match (live, candidate) {
        (Some(live), Some(candidate)) => live.as_bytes().ct_eq(candidate.as_bytes()).into(),
        _ => false,
    }
}
