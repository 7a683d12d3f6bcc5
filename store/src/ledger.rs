use rusqlite::{OptionalExtension, params};
use securescape_core::{AccountLedger, LedgerError};
use securescape_types::{Amount, UserId};

use crate::{DemoStore, StoreError};

/// Public face of a user row. The password column never leaves the store
/// through this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub balance: f64,
}

impl DemoStore {
    pub fn user_id_by_username(&self, username: &str) -> Result<Option<UserId>, StoreError> {
        let id = self
            .conn()
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.map(UserId::new))
    }

    pub fn account(&self, user: UserId) -> Result<Option<Account>, StoreError> {
        let account = self
            .conn()
            .query_row(
                "SELECT id, username, email, role, balance FROM users WHERE id = ?1",
                params![user.value()],
                |row| {
                    Ok(Account {
                        id: UserId::new(row.get(0)?),
                        username: row.get(1)?,
                        email: row.get(2)?,
                        role: row.get(3)?,
                        balance: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(account)
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl AccountLedger for DemoStore {
    fn read(&self, user: UserId) -> Result<f64, LedgerError> {
        self.account(user)?
            .map(|account| account.balance)
            .ok_or(LedgerError::UnknownAccount(user))
    }

    fn debit(&self, user: UserId, amount: f64) -> Result<f64, LedgerError> {
        let amount = Amount::new(amount)?;
        // Single UPDATE ... RETURNING under the connection lock: the
        // read-modify-write cannot interleave with another debit. The range
        // guard keeps -inf out of the column.
        let balance = self
            .conn()
            .query_row(
                "UPDATE users SET balance = balance - ?1
                 WHERE id = ?2 AND balance - ?1 >= ?3
                 RETURNING balance",
                params![amount.value(), user.value(), f64::MIN],
                |row| row.get::<_, f64>(0),
            )
            .optional()
            .map_err(StoreError::from)?;
        match balance {
            Some(balance) => Ok(balance),
            None if self.account(user)?.is_some() => Err(LedgerError::BalanceOutOfRange(user)),
            None => Err(LedgerError::UnknownAccount(user)),
        }
    }
}
