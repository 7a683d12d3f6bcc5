//! Cookie-backed session ids.
//!
//! Requests without a usable `SESSIONID` cookie are given a fresh id, and the
//! response carries the `Set-Cookie` for it. No `SameSite` attribute is set:
//! browsers must keep attaching the cookie to cross-site requests for the
//! attack routes to be exploitable.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use securescape_types::SessionId;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::api_error;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "SESSIONID";

/// Session attached to the request by [`ensure_session`].
#[derive(Debug, Clone)]
pub(crate) struct CurrentSession {
    pub id: SessionId,
    pub times: SessionTimes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SessionTimes {
    pub created: DateTime<Utc>,
    /// Start of the previous request on this session, or `created` if this
    /// is the first.
    pub last_accessed: DateTime<Utc>,
}

/// Creation and last-access time of every session id the server has seen.
///
/// Entries are never evicted, the same as the session bindings in core.
#[derive(Debug, Default)]
pub(crate) struct SessionClock {
    seen: Mutex<HashMap<SessionId, SessionTimes>>,
}

impl SessionClock {
    /// Record a request on `session` at `now` and return the times as they
    /// stood before it.
    pub(crate) fn touch(&self, session: &SessionId, now: DateTime<Utc>) -> SessionTimes {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        match seen.entry(session.clone()) {
            Entry::Occupied(mut entry) => {
                let before = *entry.get();
                entry.get_mut().last_accessed = now;
                before
            }
            Entry::Vacant(entry) => *entry.insert(SessionTimes {
                created: now,
                last_accessed: now,
            }),
        }
    }
}

/// All cookies on the request, by name. Later duplicates win.
pub(crate) fn cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

fn session_from_cookie(headers: &HeaderMap) -> Option<SessionId> {
    cookies(headers)
        .remove(SESSION_COOKIE)
        .and_then(|value| SessionId::new(value).ok())
}

pub(crate) async fn ensure_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let (id, fresh) = match session_from_cookie(request.headers()) {
        Some(id) => (id, false),
        None => match SessionId::new(Uuid::new_v4().to_string()) {
            Ok(id) => (id, true),
            Err(err) => {
                return api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SESSION",
                    err.to_string(),
                    "Could not start a session",
                )
                .into_response();
            }
        },
    };

    let times = state.session_clock().touch(&id, Utc::now());
    request.extensions_mut().insert(CurrentSession {
        id: id.clone(),
        times,
    });
    let mut response = next.run(request).await;

    if fresh {
        tracing::debug!(session = %id, "Started session");
        let cookie = format!("{SESSION_COOKIE}={id}; HttpOnly; Path=/");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}
