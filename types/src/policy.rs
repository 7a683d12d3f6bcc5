use serde::{Deserialize, Serialize};

/// Which guard runs in front of a balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferPolicy {
    /// Anti-forgery token is validated before the debit and rotated after it.
    Strict,
    /// Debit runs on session identity alone.
    Permissive,
}

impl TransferPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Permissive => "permissive",
        }
    }
}

/// The two faces of every demo: the vulnerable route family and its fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    Attack,
    Secure,
}

impl SecurityMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Secure => "secure",
        }
    }

    /// URL prefix the route family is mounted under.
    #[must_use]
    pub const fn route_prefix(self) -> &'static str {
        match self {
            Self::Attack => "/api/attack",
            Self::Secure => "/api/secure",
        }
    }

    #[must_use]
    pub const fn transfer_policy(self) -> TransferPolicy {
        match self {
            Self::Attack => TransferPolicy::Permissive,
            Self::Secure => TransferPolicy::Strict,
        }
    }
}
