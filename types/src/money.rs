//! Transfer amounts.
//!
//! Balances are plain `f64` values owned by the ledger. `Amount` is the only
//! thing the ledger will subtract from them, so a debit of zero, a negative
//! value, or NaN is unrepresentable once it reaches the ledger.

use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq)]
#[error("transfer amount must be a finite number greater than zero (got {0})")]
pub struct InvalidAmount(pub f64);

/// A strictly positive, finite transfer amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    pub fn new(value: f64) -> Result<Self, InvalidAmount> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(InvalidAmount(value))
        }
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}
