//! Error taxonomy for balance mutations.
//!
//! Each variant carries a stable [`code`](TransferError::code) so callers can
//! tell failures apart without parsing the display text.

use securescape_types::{InvalidAmount, UserId};
use thiserror::Error;

/// Failures reported by an [`AccountLedger`](crate::AccountLedger).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error(transparent)]
    InvalidAmount(#[from] InvalidAmount),
    #[error("no account exists for user {0}")]
    UnknownAccount(UserId),
    /// The debit would push the balance past the smallest finite `f64`.
    #[error("debit would take the balance of user {0} out of range")]
    BalanceOutOfRange(UserId),
    #[error("ledger storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::BalanceOutOfRange(_) => "BALANCE_OUT_OF_RANGE",
            Self::Storage(_) => "LEDGER_STORAGE",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransferError {
    /// The session has no resolvable identity.
    #[error("user not authenticated")]
    Unauthenticated,
    /// Token missing, mismatched, or the session holds no live token. The
    /// three cases are deliberately indistinguishable.
    #[error("invalid CSRF token")]
    InvalidToken,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl TransferError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Ledger(err) => err.code(),
        }
    }
}
