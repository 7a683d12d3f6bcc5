//! Core domain types for SecureScape.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod ids;
mod money;
mod policy;
mod sanitize;
mod token;
pub mod wire;

pub use ids::{InvalidSessionId, SessionId, UserId};
pub use money::{Amount, InvalidAmount};
pub use policy::{SecurityMode, TransferPolicy};
pub use sanitize::escape_html;
pub use token::CsrfToken;

/// Username of the account the demo session registry attaches to new sessions.
pub const DEFAULT_VICTIM_USERNAME: &str = "user1";

/// Upper bound on stored comment length for the escaped comment board.
pub const MAX_COMMENT_CHARS: usize = 1000;
