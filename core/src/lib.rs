//! Core domain logic for SecureScape.
//!
//! This crate holds the only stateful part of the harness: the session-bound
//! anti-forgery token protocol and the gateway that debits balances under
//! either a strict or a permissive policy.
//!
//! ```text
//! request -> SessionRegistry::resolve_or_bootstrap
//!         -> (Strict) TokenStore::validate
//!         -> AccountLedger::debit
//!         -> (Strict) TokenStore::rotate
//! ```
//!
//! Account storage and session identity are collaborators behind the
//! [`AccountLedger`] and [`SessionRegistry`] traits so tests can inject
//! arbitrary state without standing up the HTTP layer.

pub mod errors;
mod gateway;
mod ledger;
mod session;
mod token;

pub use errors::{LedgerError, TransferError};
pub use gateway::{MutationGateway, PermissiveTransfer, StrictTransfer};
pub use ledger::{AccountLedger, InMemoryLedger};
pub use session::{DemoSessionRegistry, SessionRegistry};
pub use token::{OsRngIssuer, SequentialIssuer, Spend, TOKEN_BYTES, TokenIssuer, TokenStore};
