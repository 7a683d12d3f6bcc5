//! Policy-gated balance mutation.
//!
//! Both policies run the same resolve-then-debit path; the only difference is
//! whether the token check sits between the two. Keeping them on one code
//! path makes that check the entire behavioral delta between the attack and
//! secure routes.

use std::sync::Arc;

use securescape_types::{CsrfToken, SessionId, TransferPolicy, UserId};

use crate::{AccountLedger, SessionRegistry, Spend, TokenStore, TransferError};

/// Result of an accepted strict transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct StrictTransfer {
    pub user: UserId,
    pub new_balance: f64,
    /// Replaces the token that authorized this transfer.
    pub new_token: CsrfToken,
}

/// Result of an accepted permissive transfer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PermissiveTransfer {
    pub user: UserId,
    pub new_balance: f64,
}

#[derive(Clone)]
pub struct MutationGateway {
    sessions: Arc<dyn SessionRegistry>,
    tokens: Arc<TokenStore>,
    ledger: Arc<dyn AccountLedger>,
}

impl std::fmt::Debug for MutationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationGateway")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl MutationGateway {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionRegistry>,
        tokens: Arc<TokenStore>,
        ledger: Arc<dyn AccountLedger>,
    ) -> Self {
        Self {
            sessions,
            tokens,
            ledger,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    #[must_use]
    pub fn ledger(&self) -> &dyn AccountLedger {
        self.ledger.as_ref()
    }

    #[must_use]
    pub fn sessions(&self) -> &dyn SessionRegistry {
        self.sessions.as_ref()
    }

    /// Load the form: issue a fresh token bound to `session`.
    pub fn issue_token(&self, session: &SessionId) -> CsrfToken {
        self.tokens.generate(session)
    }

    /// Debit behind the anti-forgery check, then rotate the spent token.
    ///
    /// The token is validated strictly before the ledger is touched, for
    /// every amount. A ledger failure after a valid token leaves the token
    /// live, since nothing was spent.
    pub fn transfer_strict(
        &self,
        session: &SessionId,
        amount: f64,
        candidate: Option<&str>,
    ) -> Result<StrictTransfer, TransferError> {
        let policy = TransferPolicy::Strict;
        let user = self.resolve(policy, session)?;
        let spend = self.tokens.spend(session, candidate, || {
            self.debit(policy, session, user, amount)
        })?;

        match spend {
            Spend::Applied { value, next } => Ok(StrictTransfer {
                user,
                new_balance: value,
                new_token: next,
            }),
            Spend::Rejected => {
                tracing::warn!(
                    session = %session,
                    user = %user,
                    "Transfer rejected: anti-forgery token did not validate"
                );
                Err(TransferError::InvalidToken)
            }
        }
    }

    /// Debit on session identity alone. No token is consulted.
    pub fn transfer_permissive(
        &self,
        session: &SessionId,
        amount: f64,
    ) -> Result<PermissiveTransfer, TransferError> {
        let policy = TransferPolicy::Permissive;
        let user = self.resolve(policy, session)?;
        let new_balance = self.debit(policy, session, user, amount)?;
        Ok(PermissiveTransfer { user, new_balance })
    }

    fn resolve(&self, policy: TransferPolicy, session: &SessionId) -> Result<UserId, TransferError> {
        self.sessions.resolve_or_bootstrap(session).ok_or_else(|| {
            tracing::warn!(
                session = %session,
                policy = policy.as_str(),
                "Transfer rejected: no authenticated user"
            );
            TransferError::Unauthenticated
        })
    }

    /// The one ledger call both policies share.
    fn debit(
        &self,
        policy: TransferPolicy,
        session: &SessionId,
        user: UserId,
        amount: f64,
    ) -> Result<f64, TransferError> {
        match self.ledger.debit(user, amount) {
            Ok(new_balance) => {
                tracing::info!(
                    session = %session,
                    user = %user,
                    policy = policy.as_str(),
                    amount,
                    new_balance,
                    "Transfer applied"
                );
                Ok(new_balance)
            }
            Err(err) => {
                tracing::warn!(
                    session = %session,
                    user = %user,
                    policy = policy.as_str(),
                    "Transfer rejected by ledger: {err}"
                );
                Err(err.into())
            }
        }
    }
}
