use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use securescape_types::{Amount, UserId};

use crate::LedgerError;

/// Balance storage keyed by user id.
///
/// `debit` must be atomic per user: the read-modify-write of one debit never
/// interleaves with another debit against the same account. Amount
/// validation is the ledger's job, not the caller's.
pub trait AccountLedger: Send + Sync {
    fn read(&self, user: UserId) -> Result<f64, LedgerError>;

    /// Subtract `amount` and return the new balance.
    ///
    /// Overdrafts are allowed; the demo shows an attacker draining an
    /// account past zero. A debit whose result is not a finite `f64` fails
    /// with [`LedgerError::BalanceOutOfRange`] and leaves the balance as it
    /// was.
    fn debit(&self, user: UserId, amount: f64) -> Result<f64, LedgerError>;
}

/// Ledger kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: Mutex<HashMap<UserId, f64>>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn with_accounts(accounts: impl IntoIterator<Item = (UserId, f64)>) -> Self {
        Self {
            balances: Mutex::new(accounts.into_iter().collect()),
        }
    }

    pub fn open_account(&self, user: UserId, balance: f64) {
        self.lock().insert(user, balance);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, f64>> {
        self.balances.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AccountLedger for InMemoryLedger {
    fn read(&self, user: UserId) -> Result<f64, LedgerError> {
        self.lock()
            .get(&user)
            .copied()
            .ok_or(LedgerError::UnknownAccount(user))
    }

    fn debit(&self, user: UserId, amount: f64) -> Result<f64, LedgerError> {
        let amount = Amount::new(amount)?;
        let mut balances = self.lock();
        let balance = balances
            .get_mut(&user)
            .ok_or(LedgerError::UnknownAccount(user))?;
        let next = *balance - amount.value();
        if !next.is_finite() {
            return Err(LedgerError::BalanceOutOfRange(user));
        }
        *balance = next;
        Ok(next)
    }
}
