//! # Authcache Core
//!
//! `authcache-core` provides the foundational types shared by the authcache crates:
//! the opaque [`SessionToken`] handed to clients during an OAuth login, the closed
//! [`SessionStatus`] enum stored against it, and the [`AuthError`] taxonomy every
//! cache and lifecycle operation reports through.

#![warn(missing_docs)]

/// Errors that can occur while issuing, storing or reading session state.
pub mod error;
pub use crate::error::AuthError;

/// Cryptographically random session tokens.
pub mod token;
pub use crate::token::SessionToken;

/// The login status recorded for each session token.
pub mod status;
pub use crate::status::SessionStatus;

/// The hash field under which a session's status is stored.
pub const STATUS_FIELD: &str = "status";
