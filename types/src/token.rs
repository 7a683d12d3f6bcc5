use std::fmt;

use serde::Serialize;

/// An anti-forgery token as handed to the client.
///
/// The value is a secret for as long as it is live, so `Debug` never prints
/// it. Use [`CsrfToken::expose`] at the one place it has to leave the process.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Wrap an already-encoded token value.
    #[must_use]
    pub fn from_encoded(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

// Manual Debug impl to prevent leaking live tokens in logs.
impl fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CsrfToken").field(&"[REDACTED]").finish()
    }
}
