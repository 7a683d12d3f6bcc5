use std::fmt;

use thiserror::Error;

/// Longest session id accepted from a cookie.
const MAX_SESSION_ID_LEN: usize = 128;

/// Opaque identifier for a caller's session.
///
/// Only ASCII alphanumerics and `-`/`_` are accepted, so a session id can be
/// echoed back in a `Set-Cookie` header without quoting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("session id must be 1 to 128 characters of [A-Za-z0-9_-]")]
pub struct InvalidSessionId;

impl SessionId {
    pub fn new(value: impl Into<String>) -> Result<Self, InvalidSessionId> {
        let value = value.into();
        let well_formed = !value.is_empty()
            && value.len() <= MAX_SESSION_ID_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if well_formed {
            Ok(Self(value))
        } else {
            Err(InvalidSessionId)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
